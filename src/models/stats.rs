//! Dashboard statistics.

use chrono::NaiveDate;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

/// Figures shown on the dashboard stat cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub customers: u64,
    pub active_profiles: u64,
    pub online_profiles: u64,
    pub total_content: u64,
    pub sessions_last_24h: u64,
    pub total_hours: f64,
    pub monthly_revenue: f64,
    pub average_rating: f64,
    pub average_completion: f64,
    pub recent_activity: Vec<ActivityRow>,
}

/// A recent viewing session for the activity list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct ActivityRow {
    pub watch_date: NaiveDate,
    pub duration_watched: f64,
    pub title_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ActivityRow {
    pub fn description(&self) -> String {
        format!(
            "Watched \"{}\" for {:.1} minutes",
            self.title_name.as_deref().unwrap_or("Unknown"),
            self.duration_watched
        )
    }

    pub fn user(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => format!("{} {}", f, l),
            _ => "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_description() {
        let row = ActivityRow {
            watch_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            duration_watched: 42.26,
            title_name: None,
            first_name: Some("Ari".to_string()),
            last_name: None,
        };
        assert_eq!(row.description(), "Watched \"Unknown\" for 42.3 minutes");
        assert_eq!(row.user(), "N/A");
    }
}
