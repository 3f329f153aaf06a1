pub use super::customer::Entity as Customer;
pub use super::devices::Entity as Devices;
pub use super::favorites::Entity as Favorites;
pub use super::marks_as_favorite::Entity as MarksAsFavorite;
pub use super::payment::Entity as Payment;
pub use super::profile::Entity as Profile;
pub use super::reviews::Entity as Reviews;
pub use super::title::Entity as Title;
pub use super::watch_history::Entity as WatchHistory;
