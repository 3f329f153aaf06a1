//! Row-count and referential checks after a population run.

use sea_orm::sea_query::Query;
use sea_orm::*;

use crate::db::get_table_counts;
use crate::entities::{customer, devices, favorites, marks_as_favorite, payment, prelude::*, profile, reviews, watch_history};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCheck {
    pub table: &'static str,
    pub count: u64,
    pub passed: bool,
}

/// Per-table counts against a threshold plus dangling foreign keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub threshold: u64,
    pub tables: Vec<TableCheck>,
    /// `(table.column, rows whose reference does not resolve)`.
    pub dangling: Vec<(&'static str, u64)>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.tables.iter().all(|t| t.passed) && self.dangling_total() == 0
    }

    pub fn dangling_total(&self) -> u64 {
        self.dangling.iter().map(|(_, n)| n).sum()
    }

    /// Plain text lines for the CLI and the activity log.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .tables
            .iter()
            .map(|t| {
                format!(
                    "{:<16} {:>6} entries {}",
                    t.table,
                    t.count,
                    if t.passed { "ok" } else { "BELOW THRESHOLD" }
                )
            })
            .collect();
        for (reference, count) in self.dangling.iter().filter(|(_, n)| *n > 0) {
            lines.push(format!("{} has {} dangling reference(s)", reference, count));
        }
        lines
    }
}

/// Count rows whose foreign keys point at missing parents. Every entry should be zero.
pub async fn dangling_references<C: ConnectionTrait>(db: &C) -> Result<Vec<(&'static str, u64)>, DbErr> {
    let customer_ids = || {
        Query::select()
            .column(customer::Column::CustomerId)
            .from(Customer)
            .to_owned()
    };
    let profile_ids = || Query::select().column(profile::Column::ProfileId).from(Profile).to_owned();

    let devices = Devices::find()
        .filter(devices::Column::CustomerId.not_in_subquery(customer_ids()))
        .count(db)
        .await?;
    let payments = Payment::find()
        .filter(payment::Column::CustomerId.not_in_subquery(customer_ids()))
        .count(db)
        .await?;
    let profile_customers = Profile::find()
        .filter(profile::Column::CustomerId.not_in_subquery(customer_ids()))
        .count(db)
        .await?;
    let profile_watch = Profile::find()
        .filter(
            profile::Column::WatchHistoryId.not_in_subquery(
                Query::select()
                    .column(watch_history::Column::WatchHistoryId)
                    .from(WatchHistory)
                    .to_owned(),
            ),
        )
        .count(db)
        .await?;
    let reviews = Reviews::find()
        .filter(reviews::Column::ProfileId.not_in_subquery(profile_ids()))
        .count(db)
        .await?;
    let mark_profiles = MarksAsFavorite::find()
        .filter(marks_as_favorite::Column::ProfileId.not_in_subquery(profile_ids()))
        .count(db)
        .await?;
    let mark_movies = MarksAsFavorite::find()
        .filter(
            marks_as_favorite::Column::MovieId.not_in_subquery(
                Query::select()
                    .column(favorites::Column::MovieId)
                    .from(Favorites)
                    .to_owned(),
            ),
        )
        .count(db)
        .await?;

    Ok(vec![
        ("devices.customerid", devices),
        ("payment.customerid", payments),
        ("profile.customerid", profile_customers),
        ("profile.watchhistoryid", profile_watch),
        ("reviews.profileid", reviews),
        ("marksasfavorite.profileid", mark_profiles),
        ("marksasfavorite.movieid", mark_movies),
    ])
}

/// Compare every table's row count with `threshold` and check references.
pub async fn verify(db: &DatabaseConnection, threshold: u64) -> Result<VerificationReport, DbErr> {
    let counts = get_table_counts(db).await?;
    let tables = counts
        .entries()
        .into_iter()
        .map(|(table, count)| TableCheck {
            table,
            count,
            passed: count >= threshold,
        })
        .collect();
    let dangling = dangling_references(db).await?;

    Ok(VerificationReport {
        threshold,
        tables,
        dangling,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{date, memory_db, seed_customer, seed_profile, seed_watch};

    #[tokio::test]
    async fn test_empty_database_fails_threshold() {
        let db = memory_db().await;
        let report = verify(&db, 1).await.unwrap();
        assert!(!report.passed());
        assert_eq!(report.tables.len(), 8);
        assert_eq!(report.dangling_total(), 0);
    }

    #[tokio::test]
    async fn test_threshold_zero_passes_consistent_data() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Ann", "Lee").await;
        seed_watch(&db, 1, 5, date(2024, 1, 1), 30.0, Some(50.0)).await;
        seed_profile(&db, 1, "Ann", 1, 1, false).await;

        let report = verify(&db, 0).await.unwrap();
        assert!(report.passed());
        assert!(report.lines().iter().all(|l| !l.contains("dangling")));
    }

    #[tokio::test]
    async fn test_detects_dangling_reference() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Ann", "Lee").await;
        seed_watch(&db, 1, 5, date(2024, 1, 1), 30.0, Some(50.0)).await;
        seed_profile(&db, 1, "Ann", 1, 1, false).await;

        // Bypass the foreign key to simulate data loaded without constraints.
        db.execute_unprepared("PRAGMA foreign_keys = OFF").await.unwrap();
        db.execute_unprepared("DELETE FROM customer").await.unwrap();

        let dangling = dangling_references(&db).await.unwrap();
        let profile_customers = dangling
            .iter()
            .find(|(name, _)| *name == "profile.customerid")
            .map(|(_, n)| *n);
        assert_eq!(profile_customers, Some(1));
    }
}
