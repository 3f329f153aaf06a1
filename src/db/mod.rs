//! Database connection pool and repositories.

pub mod connection;
pub mod customer;
pub mod favorites;
pub mod profile;
pub mod schema;
pub mod stats;
pub mod watch_history;

pub use connection::{ServerInfo, TableCounts, connect, get_table_counts, get_version, server_info, test_connection};

use sea_orm::ColumnTrait;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};

/// Case-insensitive substring match that works on PostgreSQL and SQLite.
pub(crate) fn contains_ci<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", needle.trim().to_lowercase());
    Expr::expr(Func::lower(Expr::col((col.entity_name(), col)))).like(pattern)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

    use crate::entities::{customer, favorites, profile, title, watch_history};

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Fresh in-memory database with the full schema on a single pooled connection.
    pub async fn memory_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        super::schema::create_all(&db).await.unwrap();
        db
    }

    pub async fn seed_customer(db: &DatabaseConnection, id: i32, first: &str, last: &str) {
        customer::ActiveModel {
            customer_id: Set(id),
            first_name: Set(first.to_string()),
            last_name: Set(last.to_string()),
            date_of_birth: Set(date(1990, 1, 1)),
            customer_since: Set(date(2020, 1, 1)),
            subscription_type: Set(Some("Basic".to_string())),
            payment_status: Set(None),
            last_login_date: Set(None),
        }
        .insert(db)
        .await
        .unwrap();
    }

    pub async fn seed_watch(db: &DatabaseConnection, id: i32, movie_id: i32, watch_date: NaiveDate, minutes: f64, pct: Option<f64>) {
        watch_history::ActiveModel {
            watch_history_id: Set(id),
            movie_id: Set(movie_id),
            watch_date: Set(watch_date),
            duration_watched: Set(minutes),
            completion_percentage: Set(pct),
            viewing_category: Set(Some("Regular".to_string())),
        }
        .insert(db)
        .await
        .unwrap();
    }

    pub async fn seed_profile(db: &DatabaseConnection, id: i32, name: &str, watch_id: i32, customer_id: i32, online: bool) {
        profile::ActiveModel {
            profile_id: Set(id),
            profile_name: Set(name.to_string()),
            profile_picture: Set(format!("{}.png", name)),
            is_online: Set(online),
            watch_history_id: Set(watch_id),
            customer_id: Set(customer_id),
            account_status: Set(Some("Active".to_string())),
        }
        .insert(db)
        .await
        .unwrap();
    }

    pub async fn seed_favorite(db: &DatabaseConnection, movie_id: i32, minutes: f64) {
        favorites::ActiveModel {
            movie_id: Set(movie_id),
            last_seen: Set(date(2024, 1, 1)),
            total_time_watched: Set(minutes),
        }
        .insert(db)
        .await
        .unwrap();
    }

    pub async fn seed_title(db: &DatabaseConnection, id: i32, name: &str, duration: Option<i32>) {
        title::ActiveModel {
            title_id: Set(id),
            title_name: Set(name.to_string()),
            duration: Set(duration),
        }
        .insert(db)
        .await
        .unwrap();
    }
}
