//! Database connection pool and utility functions.

use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Statement,
};
use std::time::Duration;
use tracing::log::LevelFilter;

use crate::entities::prelude::*;

/// Create a new database connection with configured pool settings.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt).await
}

/// Test database connection by executing a simple query.
pub async fn test_connection(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute_unprepared("SELECT 1").await?;
    Ok(())
}

/// Server-side session details shown after a successful login test.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub database: String,
    pub user: String,
    pub server_time: Option<DateTime<Utc>>,
    pub version: String,
}

/// Get current database, user, server time and version (PostgreSQL only).
pub async fn server_info(db: &DatabaseConnection) -> Result<ServerInfo, DbErr> {
    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT current_database() AS database, current_user AS username, now() AS server_time".to_owned(),
        ))
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("server info".to_owned()))?;

    Ok(ServerInfo {
        database: row.try_get("", "database")?,
        user: row.try_get("", "username")?,
        server_time: row.try_get("", "server_time").ok(),
        version: get_version(db).await?,
    })
}

/// Get the server version string.
pub async fn get_version(db: &DatabaseConnection) -> Result<String, DbErr> {
    let backend = db.get_database_backend();
    let sql = match backend {
        DatabaseBackend::Sqlite => "SELECT sqlite_version() AS version",
        _ => "SELECT version() AS version",
    };
    let result = db.query_one(Statement::from_string(backend, sql.to_owned())).await?;

    match result {
        Some(row) => {
            let version: String = row.try_get("", "version")?;
            Ok(version)
        }
        None => Ok("Unknown".to_owned()),
    }
}

/// Get record counts for all tables.
pub async fn get_table_counts(db: &DatabaseConnection) -> Result<TableCounts, DbErr> {
    Ok(TableCounts {
        customer: Customer::find().count(db).await?,
        devices: Devices::find().count(db).await?,
        watch_history: WatchHistory::find().count(db).await?,
        favorites: Favorites::find().count(db).await?,
        payment: Payment::find().count(db).await?,
        profile: Profile::find().count(db).await?,
        reviews: Reviews::find().count(db).await?,
        marks_as_favorite: MarksAsFavorite::find().count(db).await?,
    })
}

/// Table record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub customer: u64,
    pub devices: u64,
    pub watch_history: u64,
    pub favorites: u64,
    pub payment: u64,
    pub profile: u64,
    pub reviews: u64,
    pub marks_as_favorite: u64,
}

impl TableCounts {
    /// (table name, count) pairs in schema order.
    pub fn entries(&self) -> [(&'static str, u64); 8] {
        [
            ("Customer", self.customer),
            ("Devices", self.devices),
            ("WatchHistory", self.watch_history),
            ("Favorites", self.favorites),
            ("Payment", self.payment),
            ("Profile", self.profile),
            ("Reviews", self.reviews),
            ("MarksAsFavorite", self.marks_as_favorite),
        ]
    }

    pub fn total(&self) -> u64 {
        self.entries().iter().map(|(_, n)| n).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    #[tokio::test]
    async fn test_connection_and_empty_counts() {
        let db = memory_db().await;
        test_connection(&db).await.unwrap();

        let counts = get_table_counts(&db).await.unwrap();
        assert_eq!(counts, TableCounts::default());
        assert_eq!(counts.entries().len(), 8);
    }

    #[tokio::test]
    async fn test_counts_after_insert() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Noa", "Katz").await;
        seed_customer(&db, 2, "Eli", "Mor").await;

        let counts = get_table_counts(&db).await.unwrap();
        assert_eq!(counts.customer, 2);
        assert_eq!(counts.total(), 2);
    }

    #[tokio::test]
    async fn test_sqlite_version() {
        let db = memory_db().await;
        let version = get_version(&db).await.unwrap();
        assert!(version.starts_with('3'));
    }
}
