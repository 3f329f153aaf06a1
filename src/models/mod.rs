//! DTOs, joined view rows and value enums shared by the repositories and UI.

pub mod customer;
pub mod favorites;
pub mod profile;
pub mod stats;
pub mod watch_history;

pub use customer::{CreateCustomer, UpdateCustomer};
pub use favorites::MarkRow;
pub use profile::{AccountStatus, CreateProfile, ProfileFilter, ProfileRow, UpdateProfile};
pub use stats::{ActivityRow, DashboardStats};
pub use watch_history::{
    CompletionBand, CreateWatchHistory, UpdateWatchHistory, ViewingCategory, WatchHistoryFilter, WatchHistoryRow,
};
