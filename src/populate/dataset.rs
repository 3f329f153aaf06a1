//! Fixture records and the in-memory dataset one source inserts.
//!
//! Records serialize with the fixture file keys (`customerID`,
//! `WatchHistoryID`, camelCase elsewhere) so the JSON and Excel sources
//! share one representation.

use std::collections::HashSet;

use chrono::NaiveDate;
use sea_orm::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::entities::{customer, devices, favorites, marks_as_favorite, payment, profile, reviews, watch_history};

/// A fixture row type stored in its own file.
pub trait Record: Serialize + DeserializeOwned {
    /// File name without extension, also used as the sheet name.
    const STEM: &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "customerID")]
    pub customer_id: i32,
    pub date_of_birth: NaiveDate,
    pub customer_since: NaiveDate,
    #[serde(default)]
    pub subscription_type: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub device_name: String,
    #[serde(rename = "deviceID")]
    pub device_id: i32,
    pub last_seen: NaiveDate,
    pub device_type: String,
    #[serde(rename = "customerID")]
    pub customer_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryRecord {
    #[serde(rename = "movieID")]
    pub movie_id: i32,
    pub watch_date: NaiveDate,
    pub duration_watched: f64,
    #[serde(rename = "WatchHistoryID")]
    pub watch_history_id: i32,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
    #[serde(default)]
    pub viewing_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    #[serde(rename = "movieID")]
    pub movie_id: i32,
    pub last_seen: NaiveDate,
    pub total_time_watched: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(rename = "paymentID")]
    pub payment_id: i32,
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    #[serde(rename = "customerID")]
    pub customer_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub profile_name: String,
    pub profile_picture: String,
    pub is_online: bool,
    #[serde(rename = "profileID")]
    pub profile_id: i32,
    #[serde(rename = "WatchHistoryID")]
    pub watch_history_id: i32,
    #[serde(rename = "customerID")]
    pub customer_id: i32,
    #[serde(default)]
    pub account_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub rating: i32,
    #[serde(rename = "movieID")]
    pub movie_id: i32,
    pub comment: String,
    pub review_date: NaiveDate,
    #[serde(rename = "profileID")]
    pub profile_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkRecord {
    #[serde(rename = "profileID")]
    pub profile_id: i32,
    #[serde(rename = "movieID")]
    pub movie_id: i32,
}

impl Record for CustomerRecord {
    const STEM: &'static str = "customers";
}
impl Record for DeviceRecord {
    const STEM: &'static str = "devices";
}
impl Record for WatchHistoryRecord {
    const STEM: &'static str = "watch_history";
}
impl Record for FavoriteRecord {
    const STEM: &'static str = "favorites";
}
impl Record for PaymentRecord {
    const STEM: &'static str = "payments";
}
impl Record for ProfileRecord {
    const STEM: &'static str = "profiles";
}
impl Record for ReviewRecord {
    const STEM: &'static str = "reviews";
}
impl Record for MarkRecord {
    const STEM: &'static str = "marks_as_favorite";
}

/// Rows for all eight tables produced by one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub customers: Vec<CustomerRecord>,
    pub devices: Vec<DeviceRecord>,
    pub watch_history: Vec<WatchHistoryRecord>,
    pub favorites: Vec<FavoriteRecord>,
    pub payments: Vec<PaymentRecord>,
    pub profiles: Vec<ProfileRecord>,
    pub reviews: Vec<ReviewRecord>,
    pub marks: Vec<MarkRecord>,
}

/// Rows per insert statement; keeps SQLite under its bound-variable limit.
const INSERT_CHUNK: usize = 100;

async fn insert_chunked<C, A>(db: &C, models: Vec<A>) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let mut models = models.into_iter().peekable();
    while models.peek().is_some() {
        let chunk: Vec<A> = models.by_ref().take(INSERT_CHUNK).collect();
        A::Entity::insert_many(chunk).exec_without_returning(db).await?;
    }
    Ok(())
}

impl Dataset {
    pub fn total_rows(&self) -> usize {
        self.customers.len()
            + self.devices.len()
            + self.watch_history.len()
            + self.favorites.len()
            + self.payments.len()
            + self.profiles.len()
            + self.reviews.len()
            + self.marks.len()
    }

    /// Problems that would make the dataset fail to insert on its own:
    /// duplicate keys and references to rows outside the dataset.
    pub fn integrity_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        fn unique<T: Eq + std::hash::Hash>(
            problems: &mut Vec<String>,
            table: &str,
            keys: impl Iterator<Item = T>,
        ) -> HashSet<T> {
            let mut seen = HashSet::new();
            let mut duplicates = 0;
            for key in keys {
                if !seen.insert(key) {
                    duplicates += 1;
                }
            }
            if duplicates > 0 {
                problems.push(format!("{}: {} duplicate key(s)", table, duplicates));
            }
            seen
        }

        let customers = unique(&mut problems, "customer", self.customers.iter().map(|c| c.customer_id));
        unique(&mut problems, "devices", self.devices.iter().map(|d| d.device_id));
        let watch = unique(
            &mut problems,
            "watchhistory",
            self.watch_history.iter().map(|w| w.watch_history_id),
        );
        let favorites = unique(&mut problems, "favorites", self.favorites.iter().map(|f| f.movie_id));
        unique(&mut problems, "payment", self.payments.iter().map(|p| p.payment_id));
        let profiles = unique(&mut problems, "profile", self.profiles.iter().map(|p| p.profile_id));
        unique(&mut problems, "reviews", self.reviews.iter().map(|r| r.movie_id));
        unique(&mut problems, "marksasfavorite", self.marks.iter().cloned());

        let mut dangling = |table: &str, count: usize| {
            if count > 0 {
                problems.push(format!("{}: {} dangling reference(s)", table, count));
            }
        };
        dangling(
            "devices.customerid",
            self.devices.iter().filter(|d| !customers.contains(&d.customer_id)).count(),
        );
        dangling(
            "payment.customerid",
            self.payments.iter().filter(|p| !customers.contains(&p.customer_id)).count(),
        );
        dangling(
            "profile.customerid",
            self.profiles.iter().filter(|p| !customers.contains(&p.customer_id)).count(),
        );
        dangling(
            "profile.watchhistoryid",
            self.profiles.iter().filter(|p| !watch.contains(&p.watch_history_id)).count(),
        );
        dangling(
            "reviews.profileid",
            self.reviews.iter().filter(|r| !profiles.contains(&r.profile_id)).count(),
        );
        dangling(
            "marksasfavorite.profileid",
            self.marks.iter().filter(|m| !profiles.contains(&m.profile_id)).count(),
        );
        dangling(
            "marksasfavorite.movieid",
            self.marks.iter().filter(|m| !favorites.contains(&m.movie_id)).count(),
        );

        problems
    }

    /// Insert every table in foreign-key order.
    pub async fn insert<C: ConnectionTrait>(&self, db: &C) -> Result<(), DbErr> {
        insert_chunked(
            db,
            self.customers
                .iter()
                .map(|c| customer::ActiveModel {
                    customer_id: Set(c.customer_id),
                    first_name: Set(c.first_name.clone()),
                    last_name: Set(c.last_name.clone()),
                    date_of_birth: Set(c.date_of_birth),
                    customer_since: Set(c.customer_since),
                    subscription_type: Set(c.subscription_type.clone()),
                    payment_status: Set(c.payment_status.clone()),
                    last_login_date: Set(None),
                })
                .collect(),
        )
        .await?;

        insert_chunked(
            db,
            self.watch_history
                .iter()
                .map(|w| watch_history::ActiveModel {
                    watch_history_id: Set(w.watch_history_id),
                    movie_id: Set(w.movie_id),
                    watch_date: Set(w.watch_date),
                    duration_watched: Set(w.duration_watched),
                    completion_percentage: Set(w.completion_percentage),
                    viewing_category: Set(w.viewing_category.clone()),
                })
                .collect(),
        )
        .await?;

        insert_chunked(
            db,
            self.favorites
                .iter()
                .map(|f| favorites::ActiveModel {
                    movie_id: Set(f.movie_id),
                    last_seen: Set(f.last_seen),
                    total_time_watched: Set(f.total_time_watched),
                })
                .collect(),
        )
        .await?;

        insert_chunked(
            db,
            self.devices
                .iter()
                .map(|d| devices::ActiveModel {
                    device_id: Set(d.device_id),
                    device_name: Set(d.device_name.clone()),
                    last_seen: Set(d.last_seen),
                    device_type: Set(d.device_type.clone()),
                    customer_id: Set(d.customer_id),
                })
                .collect(),
        )
        .await?;

        insert_chunked(
            db,
            self.payments
                .iter()
                .map(|p| payment::ActiveModel {
                    payment_id: Set(p.payment_id),
                    payment_date: Set(p.payment_date),
                    amount: Set(p.amount),
                    currency: Set(p.currency.clone()),
                    payment_method: Set(p.payment_method.clone()),
                    status: Set(p.status.clone()),
                    customer_id: Set(p.customer_id),
                })
                .collect(),
        )
        .await?;

        insert_chunked(
            db,
            self.profiles
                .iter()
                .map(|p| profile::ActiveModel {
                    profile_id: Set(p.profile_id),
                    profile_name: Set(p.profile_name.clone()),
                    profile_picture: Set(p.profile_picture.clone()),
                    is_online: Set(p.is_online),
                    watch_history_id: Set(p.watch_history_id),
                    customer_id: Set(p.customer_id),
                    account_status: Set(p.account_status.clone()),
                })
                .collect(),
        )
        .await?;

        insert_chunked(
            db,
            self.reviews
                .iter()
                .map(|r| reviews::ActiveModel {
                    movie_id: Set(r.movie_id),
                    rating: Set(r.rating),
                    comment: Set(r.comment.clone()),
                    review_date: Set(r.review_date),
                    profile_id: Set(r.profile_id),
                })
                .collect(),
        )
        .await?;

        insert_chunked(
            db,
            self.marks
                .iter()
                .map(|m| marks_as_favorite::ActiveModel {
                    profile_id: Set(m.profile_id),
                    movie_id: Set(m.movie_id),
                })
                .collect(),
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::get_table_counts;
    use crate::db::test_support::memory_db;
    use crate::populate::{IdPlan, MockGenerator};

    #[tokio::test]
    async fn test_insert_spans_several_chunks() {
        let db = memory_db().await;
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let plan = IdPlan::split(750)[0];
        let dataset = MockGenerator::seeded(11, today).generate(&plan);
        assert!(dataset.customers.len() > INSERT_CHUNK);

        dataset.insert(&db).await.unwrap();

        let counts = get_table_counts(&db).await.unwrap();
        assert_eq!(counts.customer, dataset.customers.len() as u64);
        assert_eq!(counts.devices, dataset.devices.len() as u64);
        assert_eq!(counts.marks_as_favorite, dataset.marks.len() as u64);
    }
}
