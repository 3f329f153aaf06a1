//! Profile DTOs, filters and the joined list row.

use chrono::NaiveDate;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Account state of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Trial,
}

impl AccountStatus {
    pub const ALL: [AccountStatus; 4] = [Self::Active, Self::Inactive, Self::Suspended, Self::Trial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Suspended => "Suspended",
            Self::Trial => "Trial",
        }
    }

    /// Parse a stored value. Unknown or missing values read as `Active`.
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("Inactive") => Self::Inactive,
            Some("Suspended") => Self::Suspended,
            Some("Trial") => Self::Trial,
            _ => Self::Active,
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DTO for creating a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    pub profile_id: Option<i32>,
    pub profile_name: String,
    pub profile_picture: String,
    pub is_online: bool,
    pub watch_history_id: i32,
    pub customer_id: i32,
    pub account_status: AccountStatus,
}

impl CreateProfile {
    pub fn validate(&self) -> Result<()> {
        if self.profile_name.trim().is_empty() {
            return Err(AppError::validation("Profile name is required"));
        }
        if self.watch_history_id <= 0 {
            return Err(AppError::validation("Watch history ID must be positive"));
        }
        Ok(())
    }
}

/// DTO for updating a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub profile_name: Option<String>,
    pub profile_picture: Option<String>,
    pub is_online: Option<bool>,
    pub watch_history_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub account_status: Option<AccountStatus>,
}

/// Filters for the profile list. `None` means "all".
#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
    /// Matches profile name or owner first/last name, case-insensitive.
    pub search: String,
    pub customer_id: Option<i32>,
    pub account_status: Option<AccountStatus>,
    pub is_online: Option<bool>,
}

/// Profile joined with its owner's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct ProfileRow {
    pub profile_id: i32,
    pub profile_name: String,
    pub profile_picture: String,
    pub is_online: bool,
    pub watch_history_id: i32,
    pub customer_id: i32,
    pub account_status: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileRow {
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn status(&self) -> AccountStatus {
        AccountStatus::from_db(self.account_status.as_deref())
    }
}

/// A review written by a profile, with the reviewed title when known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct ReviewRow {
    pub movie_id: i32,
    pub rating: i32,
    pub comment: String,
    pub review_date: NaiveDate,
    pub title_name: Option<String>,
}

/// Per-profile usage figures shown in the profile detail view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileStatistics {
    pub sessions: u64,
    pub hours_watched: f64,
    pub reviews: u64,
    pub favorites: u64,
    pub average_rating: Option<f64>,
}

/// Totals across all profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub total: u64,
    pub online: u64,
    pub active: u64,
    pub unique_customers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_db_defaults_to_active() {
        assert_eq!(AccountStatus::from_db(None), AccountStatus::Active);
        assert_eq!(AccountStatus::from_db(Some("bogus")), AccountStatus::Active);
        assert_eq!(AccountStatus::from_db(Some("Trial")), AccountStatus::Trial);
    }

    #[test]
    fn test_status_names_round_trip() {
        for status in AccountStatus::ALL {
            assert_eq!(AccountStatus::from_db(Some(status.as_str())), status);
        }
    }

    #[test]
    fn test_blank_profile_name_rejected() {
        let profile = CreateProfile {
            profile_id: None,
            profile_name: String::new(),
            profile_picture: String::new(),
            is_online: false,
            watch_history_id: 1,
            customer_id: 1,
            account_status: AccountStatus::Active,
        };
        assert!(profile.validate().is_err());
    }
}
