//! Favorites catalog and profile favorite marks.

use sea_orm::*;

use crate::entities::{customer, favorites, marks_as_favorite, prelude::*, profile};
use crate::error::{AppError, Result as AppResult};
use crate::models::favorites::MarkRow;

/// List the favorites catalog ordered by movie id.
pub async fn list_favorites(db: &DatabaseConnection) -> Result<Vec<favorites::Model>, DbErr> {
    Favorites::find()
        .order_by_asc(favorites::Column::MovieId)
        .all(db)
        .await
}

/// List marks with profile and owner names, optionally for one profile.
pub async fn list_marks(db: &DatabaseConnection, profile_id: Option<i32>) -> Result<Vec<MarkRow>, DbErr> {
    let mut query = MarksAsFavorite::find()
        .join(JoinType::InnerJoin, marks_as_favorite::Relation::Profile.def())
        .join(JoinType::InnerJoin, profile::Relation::Customer.def())
        .join(JoinType::InnerJoin, marks_as_favorite::Relation::Favorites.def())
        .select_only()
        .column_as(marks_as_favorite::Column::ProfileId, "profile_id")
        .column_as(marks_as_favorite::Column::MovieId, "movie_id")
        .column_as(profile::Column::ProfileName, "profile_name")
        .column_as(customer::Column::FirstName, "first_name")
        .column_as(customer::Column::LastName, "last_name")
        .column_as(favorites::Column::TotalTimeWatched, "total_time_watched");

    if let Some(id) = profile_id {
        query = query.filter(marks_as_favorite::Column::ProfileId.eq(id));
    }

    query
        .order_by_asc(marks_as_favorite::Column::ProfileId)
        .order_by_asc(marks_as_favorite::Column::MovieId)
        .into_model::<MarkRow>()
        .all(db)
        .await
}

/// Mark a favorite for a profile. Both rows must exist and the pair must be new.
pub async fn add_mark(db: &DatabaseConnection, profile_id: i32, movie_id: i32) -> AppResult<marks_as_favorite::Model> {
    if Profile::find_by_id(profile_id).one(db).await?.is_none() {
        return Err(AppError::validation(format!("Profile {} does not exist", profile_id)));
    }
    if Favorites::find_by_id(movie_id).one(db).await?.is_none() {
        return Err(AppError::validation(format!("Movie {} is not in the favorites catalog", movie_id)));
    }
    if MarksAsFavorite::find_by_id((profile_id, movie_id)).one(db).await?.is_some() {
        return Err(AppError::validation(format!(
            "Profile {} already marked movie {} as favorite",
            profile_id, movie_id
        )));
    }

    let model = marks_as_favorite::ActiveModel {
        profile_id: Set(profile_id),
        movie_id: Set(movie_id),
    };
    Ok(model.insert(db).await?)
}

/// Remove a favorite mark.
pub async fn remove_mark(db: &DatabaseConnection, profile_id: i32, movie_id: i32) -> Result<bool, DbErr> {
    let result = MarksAsFavorite::delete_by_id((profile_id, movie_id)).exec(db).await?;
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    async fn seeded() -> DatabaseConnection {
        let db = memory_db().await;
        seed_customer(&db, 1, "Tal", "Cohen").await;
        seed_watch(&db, 1, 100, date(2024, 1, 1), 30.0, None).await;
        seed_profile(&db, 1, "TalKids", 1, 1, false).await;
        seed_favorite(&db, 100, 120.0).await;
        seed_favorite(&db, 101, 15.5).await;
        db
    }

    #[tokio::test]
    async fn test_add_and_list_marks() {
        let db = seeded().await;
        add_mark(&db, 1, 101).await.unwrap();
        add_mark(&db, 1, 100).await.unwrap();

        let marks = list_marks(&db, None).await.unwrap();
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].movie_id, 100);
        assert_eq!(marks[0].customer_name(), "Tal Cohen");
        assert_eq!(marks[1].total_time_watched, 15.5);

        assert!(list_marks(&db, Some(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_and_dangling_marks_rejected() {
        let db = seeded().await;
        add_mark(&db, 1, 100).await.unwrap();

        assert!(matches!(add_mark(&db, 1, 100).await, Err(AppError::Validation(_))));
        assert!(matches!(add_mark(&db, 9, 100).await, Err(AppError::Validation(_))));
        assert!(matches!(add_mark(&db, 1, 999).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_remove_mark() {
        let db = seeded().await;
        add_mark(&db, 1, 100).await.unwrap();

        assert!(remove_mark(&db, 1, 100).await.unwrap());
        assert!(!remove_mark(&db, 1, 100).await.unwrap());
        assert_eq!(list_favorites(&db).await.unwrap().len(), 2);
    }
}
