//! Favorites mark rows.

use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

/// A profile's favorite mark joined with the profile and owner names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct MarkRow {
    pub profile_id: i32,
    pub movie_id: i32,
    pub profile_name: String,
    pub first_name: String,
    pub last_name: String,
    pub total_time_watched: f64,
}

impl MarkRow {
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
