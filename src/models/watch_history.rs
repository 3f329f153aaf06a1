//! Watch history DTOs, filters, categories and completion helpers.

use chrono::NaiveDate;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Assumed running time in minutes for content without a known duration.
pub const DEFAULT_CONTENT_MINUTES: f64 = 45.0;

/// How a session was watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewingCategory {
    #[default]
    Regular,
    Binge,
    Sample,
    Rewatch,
}

impl ViewingCategory {
    pub const ALL: [ViewingCategory; 4] = [Self::Regular, Self::Binge, Self::Sample, Self::Rewatch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::Binge => "Binge",
            Self::Sample => "Sample",
            Self::Rewatch => "Rewatch",
        }
    }

    /// Parse a stored value. Unknown or missing values read as `Regular`.
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("Binge") => Self::Binge,
            Some("Sample") => Self::Sample,
            Some("Rewatch") => Self::Rewatch,
            _ => Self::Regular,
        }
    }
}

impl std::fmt::Display for ViewingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion filter bands used by the watch history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionBand {
    /// More than 80%.
    Complete,
    /// 20% to 80% inclusive.
    Partial,
    /// Under 20%.
    Sample,
}

impl CompletionBand {
    pub const ALL: [CompletionBand; 3] = [Self::Complete, Self::Partial, Self::Sample];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Complete => "Complete (>80%)",
            Self::Partial => "Partial (20-80%)",
            Self::Sample => "Sample (<20%)",
        }
    }

    pub fn contains(&self, percentage: f64) -> bool {
        match self {
            Self::Complete => percentage > 80.0,
            Self::Partial => (20.0..=80.0).contains(&percentage),
            Self::Sample => percentage < 20.0,
        }
    }
}

/// Buckets for the completion distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompletionBucket {
    Complete,
    Mostly,
    Partial,
    Sample,
    Unknown,
}

impl CompletionBucket {
    pub fn from_percentage(percentage: Option<f64>) -> Self {
        match percentage {
            Some(p) if p >= 80.0 => Self::Complete,
            Some(p) if p >= 50.0 => Self::Mostly,
            Some(p) if p >= 20.0 => Self::Partial,
            Some(_) => Self::Sample,
            None => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Complete => "Complete (80%+)",
            Self::Mostly => "Mostly (50-80%)",
            Self::Partial => "Partial (20-50%)",
            Self::Sample => "Sample (<20%)",
            Self::Unknown => "Unknown",
        }
    }
}

/// Estimate completion from minutes watched and the content's running time.
pub fn estimate_completion(watched_minutes: f64, content_minutes: Option<f64>) -> f64 {
    let duration = content_minutes
        .filter(|d| *d > 0.0)
        .unwrap_or(DEFAULT_CONTENT_MINUTES);
    (watched_minutes / duration * 100.0).clamp(0.0, 100.0)
}

/// DTO for creating a watch history record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWatchHistory {
    pub watch_history_id: Option<i32>,
    pub movie_id: i32,
    pub watch_date: NaiveDate,
    pub duration_watched: f64,
    pub completion_percentage: Option<f64>,
    pub viewing_category: ViewingCategory,
}

/// DTO for updating a watch history record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWatchHistory {
    pub movie_id: Option<i32>,
    pub watch_date: Option<NaiveDate>,
    pub duration_watched: Option<f64>,
    pub completion_percentage: Option<Option<f64>>,
    pub viewing_category: Option<ViewingCategory>,
}

/// Duration must be non-negative and completion within 0..=100.
pub fn validate_values(duration_watched: Option<f64>, completion: Option<f64>) -> Result<()> {
    if let Some(duration) = duration_watched
        && (duration.is_nan() || duration < 0.0)
    {
        return Err(AppError::validation("Duration watched cannot be negative"));
    }
    if let Some(pct) = completion
        && !(0.0..=100.0).contains(&pct)
    {
        return Err(AppError::validation("Completion percentage must be between 0 and 100"));
    }
    Ok(())
}

impl CreateWatchHistory {
    pub fn validate(&self) -> Result<()> {
        validate_values(Some(self.duration_watched), self.completion_percentage)
    }
}

impl UpdateWatchHistory {
    pub fn validate(&self) -> Result<()> {
        validate_values(self.duration_watched, self.completion_percentage.flatten())
    }
}

/// Filters for the watch history list.
#[derive(Debug, Clone)]
pub struct WatchHistoryFilter {
    /// Matches title, profile name, or customer first/last name, case-insensitive.
    pub search: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub category: Option<ViewingCategory>,
    pub completion: Option<CompletionBand>,
}

impl WatchHistoryFilter {
    /// Filter covering the last `days` days up to `today`.
    pub fn last_days(today: NaiveDate, days: i64) -> Self {
        Self {
            search: String::new(),
            date_from: today - chrono::Duration::days(days),
            date_to: today,
            category: None,
            completion: None,
        }
    }
}

/// Watch history row joined with title, profile and customer names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct WatchHistoryRow {
    pub watch_history_id: i32,
    pub movie_id: i32,
    pub watch_date: NaiveDate,
    pub duration_watched: f64,
    pub completion_percentage: Option<f64>,
    pub viewing_category: Option<String>,
    pub title_name: Option<String>,
    pub profile_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl WatchHistoryRow {
    pub fn customer_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
            _ => None,
        }
    }

    pub fn category(&self) -> ViewingCategory {
        ViewingCategory::from_db(self.viewing_category.as_deref())
    }
}

/// Aggregate viewing figures for a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchAnalytics {
    pub sessions: u64,
    pub total_hours: f64,
    pub avg_duration: f64,
    pub avg_completion: f64,
    pub top_content: Vec<TopContent>,
}

/// Most watched content within a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct TopContent {
    pub movie_id: i32,
    pub title_name: Option<String>,
    pub view_count: i64,
    pub avg_duration: Option<f64>,
}

/// Per-category viewing trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct CategoryTrend {
    pub viewing_category: Option<String>,
    pub total_views: i64,
    pub avg_duration: Option<f64>,
    pub avg_completion: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_completion_uses_default_length() {
        assert_eq!(estimate_completion(45.0, None), 100.0);
        assert!((estimate_completion(9.0, None) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_completion_caps_at_100() {
        assert_eq!(estimate_completion(200.0, Some(90.0)), 100.0);
        assert!((estimate_completion(45.0, Some(90.0)) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_completion_ignores_zero_duration() {
        assert!((estimate_completion(22.5, Some(0.0)) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_completion_band_edges() {
        assert!(CompletionBand::Complete.contains(80.1));
        assert!(!CompletionBand::Complete.contains(80.0));
        assert!(CompletionBand::Partial.contains(80.0));
        assert!(CompletionBand::Partial.contains(20.0));
        assert!(CompletionBand::Sample.contains(19.9));
    }

    #[test]
    fn test_completion_bucket() {
        assert_eq!(CompletionBucket::from_percentage(Some(80.0)), CompletionBucket::Complete);
        assert_eq!(CompletionBucket::from_percentage(Some(55.0)), CompletionBucket::Mostly);
        assert_eq!(CompletionBucket::from_percentage(Some(20.0)), CompletionBucket::Partial);
        assert_eq!(CompletionBucket::from_percentage(Some(3.0)), CompletionBucket::Sample);
        assert_eq!(CompletionBucket::from_percentage(None), CompletionBucket::Unknown);
    }

    #[test]
    fn test_validate_values() {
        assert!(validate_values(Some(0.0), Some(100.0)).is_ok());
        assert!(validate_values(Some(-1.0), None).is_err());
        assert!(validate_values(None, Some(100.5)).is_err());
        assert!(validate_values(Some(f64::NAN), None).is_err());
    }
}
