//! Schema creation and teardown derived from the entities.
//!
//! Tables are created in foreign-key order and dropped in reverse, so the
//! same statements work on PostgreSQL and SQLite targets.

use sea_orm::sea_query::Table;
use sea_orm::{ConnectionTrait, DbErr, EntityName, EntityTrait, Schema};

use crate::entities::prelude::*;

/// Table names in creation order.
pub const TABLES: [&str; 8] = [
    "customer",
    "watchhistory",
    "favorites",
    "devices",
    "payment",
    "profile",
    "reviews",
    "marksasfavorite",
];

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

async fn drop_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityName,
{
    let backend = db.get_database_backend();
    let stmt = Table::drop().table(entity).if_exists().to_owned();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Create every table that does not already exist, plus the title catalog.
pub async fn create_all<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create_table(db, Customer).await?;
    create_table(db, WatchHistory).await?;
    create_table(db, Favorites).await?;
    create_table(db, Devices).await?;
    create_table(db, Payment).await?;
    create_table(db, Profile).await?;
    create_table(db, Reviews).await?;
    create_table(db, MarksAsFavorite).await?;
    create_table(db, Title).await?;
    tracing::debug!("Schema ensured ({} tables + title)", TABLES.len());
    Ok(())
}

/// Drop the eight schema tables. The external title catalog is left alone.
pub async fn drop_all<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    drop_table(db, MarksAsFavorite).await?;
    drop_table(db, Reviews).await?;
    drop_table(db, Profile).await?;
    drop_table(db, Payment).await?;
    drop_table(db, Devices).await?;
    drop_table(db, Favorites).await?;
    drop_table(db, WatchHistory).await?;
    drop_table(db, Customer).await?;
    tracing::info!("Dropped {} tables", TABLES.len());
    Ok(())
}

/// Drop and recreate the schema.
pub async fn reset<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    drop_all(db).await?;
    create_all(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use sea_orm::{EntityTrait, PaginatorTrait};

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let db = memory_db().await;
        create_all(&db).await.unwrap();
        assert_eq!(Customer::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_clears_rows_but_keeps_titles() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Roni", "Bar").await;
        seed_title(&db, 7, "Heat", Some(170)).await;

        reset(&db).await.unwrap();

        assert_eq!(Customer::find().count(&db).await.unwrap(), 0);
        assert_eq!(Title::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = memory_db().await;
        // Profile references a customer and watch history that do not exist.
        let result = crate::entities::profile::ActiveModel {
            profile_id: sea_orm::Set(1),
            profile_name: sea_orm::Set("Kid".to_string()),
            profile_picture: sea_orm::Set(String::new()),
            is_online: sea_orm::Set(false),
            watch_history_id: sea_orm::Set(99),
            customer_id: sea_orm::Set(99),
            account_status: sea_orm::Set(None),
        };
        assert!(sea_orm::ActiveModelTrait::insert(result, &db).await.is_err());
    }
}
