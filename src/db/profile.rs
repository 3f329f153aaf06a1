//! Profile repository: filtered listing, CRUD, online toggle, reviews and statistics.

use chrono::Local;
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::*;

use super::contains_ci;
use crate::entities::{customer, marks_as_favorite, prelude::*, profile, reviews, title, watch_history};
use crate::error::{AppError, Result as AppResult};
use crate::models::profile::{
    AccountStatus, CreateProfile, ProfileFilter, ProfileRow, ProfileStatistics, ProfileSummary, ReviewRow,
    UpdateProfile,
};

fn row_query() -> Select<Profile> {
    Profile::find()
        .join(JoinType::InnerJoin, profile::Relation::Customer.def())
        .select_only()
        .column_as(profile::Column::ProfileId, "profile_id")
        .column_as(profile::Column::ProfileName, "profile_name")
        .column_as(profile::Column::ProfilePicture, "profile_picture")
        .column_as(profile::Column::IsOnline, "is_online")
        .column_as(profile::Column::WatchHistoryId, "watch_history_id")
        .column_as(profile::Column::CustomerId, "customer_id")
        .column_as(profile::Column::AccountStatus, "account_status")
        .column_as(customer::Column::FirstName, "first_name")
        .column_as(customer::Column::LastName, "last_name")
}

/// List profiles matching the filter, joined with the owner's name.
pub async fn list(db: &DatabaseConnection, filter: &ProfileFilter) -> Result<Vec<ProfileRow>, DbErr> {
    let mut query = row_query();

    if !filter.search.trim().is_empty() {
        query = query.filter(
            Condition::any()
                .add(contains_ci(profile::Column::ProfileName, &filter.search))
                .add(contains_ci(customer::Column::FirstName, &filter.search))
                .add(contains_ci(customer::Column::LastName, &filter.search)),
        );
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(profile::Column::CustomerId.eq(customer_id));
    }
    if let Some(status) = filter.account_status {
        query = query.filter(profile::Column::AccountStatus.eq(status.as_str()));
    }
    if let Some(online) = filter.is_online {
        query = query.filter(profile::Column::IsOnline.eq(online));
    }

    query
        .order_by_asc(profile::Column::ProfileId)
        .into_model::<ProfileRow>()
        .all(db)
        .await
}

/// Get a single profile row by ID.
pub async fn get(db: &DatabaseConnection, id: i32) -> Result<Option<ProfileRow>, DbErr> {
    row_query()
        .filter(profile::Column::ProfileId.eq(id))
        .into_model::<ProfileRow>()
        .one(db)
        .await
}

/// Get profile model by ID.
pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<profile::Model>, DbErr> {
    Profile::find_by_id(id).one(db).await
}

/// Next free profile id (max + 1).
pub async fn next_id<C: ConnectionTrait>(db: &C) -> Result<i32, DbErr> {
    let max: Option<Option<i32>> = Profile::find()
        .select_only()
        .column_as(profile::Column::ProfileId.max(), "max_id")
        .into_tuple()
        .one(db)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

/// Insert a zero-length watch history row if `id` does not exist yet.
async fn ensure_watch_history<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), DbErr> {
    if WatchHistory::find_by_id(id).one(db).await?.is_none() {
        watch_history::ActiveModel {
            watch_history_id: Set(id),
            movie_id: Set(1),
            watch_date: Set(Local::now().date_naive()),
            duration_watched: Set(0.0),
            completion_percentage: Set(None),
            viewing_category: Set(None),
        }
        .insert(db)
        .await?;
        tracing::info!("Created placeholder watch history {}", id);
    }
    Ok(())
}

/// Create a new profile.
///
/// A missing watch history row is created as a placeholder in the same transaction.
pub async fn create(db: &DatabaseConnection, data: CreateProfile) -> AppResult<profile::Model> {
    data.validate()?;

    let txn = db.begin().await?;

    if Customer::find_by_id(data.customer_id).one(&txn).await?.is_none() {
        return Err(AppError::validation(format!("Customer {} does not exist", data.customer_id)));
    }

    let id = match data.profile_id {
        Some(id) => {
            if get_by_id(&txn, id).await?.is_some() {
                return Err(AppError::validation(format!("Profile ID {} already exists", id)));
            }
            id
        }
        None => next_id(&txn).await?,
    };

    ensure_watch_history(&txn, data.watch_history_id).await?;

    let model = profile::ActiveModel {
        profile_id: Set(id),
        profile_name: Set(data.profile_name.trim().to_string()),
        profile_picture: Set(data.profile_picture),
        is_online: Set(data.is_online),
        watch_history_id: Set(data.watch_history_id),
        customer_id: Set(data.customer_id),
        account_status: Set(Some(data.account_status.as_str().to_string())),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(model)
}

/// Update an existing profile.
pub async fn update(db: &DatabaseConnection, id: i32, data: UpdateProfile) -> AppResult<Option<profile::Model>> {
    if let Some(name) = &data.profile_name
        && name.trim().is_empty()
    {
        return Err(AppError::validation("Profile name is required"));
    }

    let txn = db.begin().await?;
    let Some(model) = get_by_id(&txn, id).await? else {
        return Ok(None);
    };

    if let Some(customer_id) = data.customer_id
        && Customer::find_by_id(customer_id).one(&txn).await?.is_none()
    {
        return Err(AppError::validation(format!("Customer {} does not exist", customer_id)));
    }

    let mut active: profile::ActiveModel = model.into();

    if let Some(profile_name) = data.profile_name {
        active.profile_name = Set(profile_name.trim().to_string());
    }
    if let Some(profile_picture) = data.profile_picture {
        active.profile_picture = Set(profile_picture);
    }
    if let Some(is_online) = data.is_online {
        active.is_online = Set(is_online);
    }
    if let Some(watch_history_id) = data.watch_history_id {
        ensure_watch_history(&txn, watch_history_id).await?;
        active.watch_history_id = Set(watch_history_id);
    }
    if let Some(customer_id) = data.customer_id {
        active.customer_id = Set(customer_id);
    }
    if let Some(status) = data.account_status {
        active.account_status = Set(Some(status.as_str().to_string()));
    }

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(Some(updated))
}

/// Delete a profile together with its favorite marks and reviews.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    MarksAsFavorite::delete_many()
        .filter(marks_as_favorite::Column::ProfileId.eq(id))
        .exec(&txn)
        .await?;
    Reviews::delete_many()
        .filter(reviews::Column::ProfileId.eq(id))
        .exec(&txn)
        .await?;
    let result = Profile::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(result.rows_affected > 0)
}

/// Flip the online flag. Returns the new state, or None if the profile is missing.
pub async fn toggle_online(db: &DatabaseConnection, id: i32) -> Result<Option<bool>, DbErr> {
    let Some(model) = get_by_id(db, id).await? else {
        return Ok(None);
    };
    let now_online = !model.is_online;
    let mut active: profile::ActiveModel = model.into();
    active.is_online = Set(now_online);
    active.update(db).await?;
    Ok(Some(now_online))
}

/// Reviews written by a profile, newest first.
pub async fn reviews_for(db: &DatabaseConnection, profile_id: i32) -> Result<Vec<ReviewRow>, DbErr> {
    let to_title: RelationDef = Reviews::belongs_to(Title)
        .from(reviews::Column::MovieId)
        .to(title::Column::TitleId)
        .into();

    Reviews::find()
        .join(JoinType::LeftJoin, to_title)
        .select_only()
        .column_as(reviews::Column::MovieId, "movie_id")
        .column_as(reviews::Column::Rating, "rating")
        .column_as(reviews::Column::Comment, "comment")
        .column_as(reviews::Column::ReviewDate, "review_date")
        .column_as(title::Column::TitleName, "title_name")
        .filter(reviews::Column::ProfileId.eq(profile_id))
        .order_by_desc(reviews::Column::ReviewDate)
        .into_model::<ReviewRow>()
        .all(db)
        .await
}

/// Usage figures for one profile.
pub async fn statistics(db: &DatabaseConnection, profile_id: i32) -> AppResult<ProfileStatistics> {
    let model = get_by_id(db, profile_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Profile {}", profile_id)))?;

    let watch = WatchHistory::find_by_id(model.watch_history_id).one(db).await?;

    let reviews = Reviews::find()
        .filter(reviews::Column::ProfileId.eq(profile_id))
        .count(db)
        .await?;

    let average_rating: Option<Option<f64>> = Reviews::find()
        .select_only()
        .column_as(
            SimpleExpr::from(Func::cast_as(
                Func::avg(Expr::col(reviews::Column::Rating)),
                Alias::new("double precision"),
            )),
            "avg_rating",
        )
        .filter(reviews::Column::ProfileId.eq(profile_id))
        .into_tuple()
        .one(db)
        .await?;

    let favorites = MarksAsFavorite::find()
        .filter(marks_as_favorite::Column::ProfileId.eq(profile_id))
        .count(db)
        .await?;

    Ok(ProfileStatistics {
        sessions: u64::from(watch.is_some()),
        hours_watched: watch.map(|w| w.duration_watched / 60.0).unwrap_or(0.0),
        reviews,
        favorites,
        average_rating: average_rating.flatten(),
    })
}

/// Totals across all profiles.
pub async fn summary(db: &DatabaseConnection) -> Result<ProfileSummary, DbErr> {
    let total = Profile::find().count(db).await?;
    let online = Profile::find()
        .filter(profile::Column::IsOnline.eq(true))
        .count(db)
        .await?;
    let active = Profile::find()
        .filter(profile::Column::AccountStatus.eq(AccountStatus::Active.as_str()))
        .count(db)
        .await?;
    let unique_customers: Option<i64> = Profile::find()
        .select_only()
        .column_as(Expr::col(profile::Column::CustomerId).count_distinct(), "count")
        .into_tuple()
        .one(db)
        .await?;

    Ok(ProfileSummary {
        total,
        online,
        active,
        unique_customers: unique_customers.unwrap_or(0) as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    async fn seeded() -> DatabaseConnection {
        let db = memory_db().await;
        seed_customer(&db, 1, "Tal", "Cohen").await;
        seed_customer(&db, 2, "Maya", "Shani").await;
        seed_watch(&db, 1, 100, date(2024, 1, 1), 90.0, Some(100.0)).await;
        seed_watch(&db, 2, 101, date(2024, 1, 2), 30.0, Some(40.0)).await;
        seed_profile(&db, 1, "TalKids", 1, 1, true).await;
        seed_profile(&db, 2, "MayaMain", 2, 2, false).await;
        db
    }

    fn new_profile(watch_history_id: i32) -> CreateProfile {
        CreateProfile {
            profile_id: None,
            profile_name: "Guest".to_string(),
            profile_picture: "guest.png".to_string(),
            is_online: false,
            watch_history_id,
            customer_id: 1,
            account_status: AccountStatus::Trial,
        }
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = seeded().await;

        let all = list(&db, &ProfileFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].customer_name(), "Tal Cohen");

        let by_owner = ProfileFilter {
            search: "shani".to_string(),
            ..Default::default()
        };
        let rows = list(&db, &by_owner).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].profile_id, 2);

        let online = ProfileFilter {
            is_online: Some(true),
            ..Default::default()
        };
        assert_eq!(list(&db, &online).await.unwrap()[0].profile_name, "TalKids");

        let trial = ProfileFilter {
            account_status: Some(AccountStatus::Trial),
            ..Default::default()
        };
        assert!(list(&db, &trial).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_makes_placeholder_watch_history() {
        let db = seeded().await;

        let created = create(&db, new_profile(50)).await.unwrap();
        assert_eq!(created.profile_id, 3);
        assert_eq!(created.account_status.as_deref(), Some("Trial"));

        let placeholder = WatchHistory::find_by_id(50).one(&db).await.unwrap().unwrap();
        assert_eq!(placeholder.duration_watched, 0.0);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_customer_without_side_effects() {
        let db = seeded().await;
        let mut data = new_profile(60);
        data.customer_id = 42;

        assert!(matches!(create(&db, data).await, Err(AppError::Validation(_))));
        assert!(WatchHistory::find_by_id(60).one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_toggle_online() {
        let db = seeded().await;
        assert_eq!(toggle_online(&db, 1).await.unwrap(), Some(false));
        assert_eq!(toggle_online(&db, 1).await.unwrap(), Some(true));
        assert_eq!(toggle_online(&db, 9).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reviews_and_statistics() {
        let db = seeded().await;
        seed_title(&db, 100, "Arrival", Some(116)).await;
        seed_favorite(&db, 100, 90.0).await;
        for (movie, rating, day) in [(100, 5, 3), (200, 2, 4)] {
            reviews::ActiveModel {
                movie_id: Set(movie),
                rating: Set(rating),
                comment: Set(String::new()),
                review_date: Set(date(2024, 1, day)),
                profile_id: Set(1),
            }
            .insert(&db)
            .await
            .unwrap();
        }
        marks_as_favorite::ActiveModel {
            profile_id: Set(1),
            movie_id: Set(100),
        }
        .insert(&db)
        .await
        .unwrap();

        let rows = reviews_for(&db, 1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].movie_id, 200);
        assert_eq!(rows[1].title_name.as_deref(), Some("Arrival"));

        let stats = statistics(&db, 1).await.unwrap();
        assert_eq!(stats.sessions, 1);
        assert!((stats.hours_watched - 1.5).abs() < 1e-9);
        assert_eq!(stats.reviews, 2);
        assert_eq!(stats.favorites, 1);
        assert!((stats.average_rating.unwrap() - 3.5).abs() < 1e-9);

        assert!(matches!(statistics(&db, 77).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_marks_and_reviews() {
        let db = seeded().await;
        seed_favorite(&db, 100, 90.0).await;
        marks_as_favorite::ActiveModel {
            profile_id: Set(2),
            movie_id: Set(100),
        }
        .insert(&db)
        .await
        .unwrap();

        assert!(delete(&db, 2).await.unwrap());
        assert_eq!(MarksAsFavorite::find().count(&db).await.unwrap(), 0);
        assert!(get(&db, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary() {
        let db = seeded().await;
        let summary = summary(&db).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.online, 1);
        assert_eq!(summary.active, 2);
        assert_eq!(summary.unique_customers, 2);
    }
}
