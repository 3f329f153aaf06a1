//! SeaORM entities for the streaming service schema.
//!
//! Table and column names are the lower-case forms PostgreSQL folds the
//! original unquoted identifiers to.

pub mod customer;
pub mod devices;
pub mod favorites;
pub mod marks_as_favorite;
pub mod payment;
pub mod prelude;
pub mod profile;
pub mod reviews;
pub mod title;
pub mod watch_history;
