//! GUI panels and application state.

pub mod app;
pub mod components;
pub mod customer_panel;
pub mod dashboard;
pub mod favorites_panel;
pub mod files;
pub mod login;
pub mod profile_panel;
pub mod queries_panel;
pub mod routines_panel;
pub mod watch_history_panel;

pub use app::App;
