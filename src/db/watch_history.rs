//! Watch history repository: filtered paging, CRUD and viewing analytics.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::*;

use super::contains_ci;
use crate::entities::{customer, prelude::*, profile, title, watch_history};
use crate::error::{AppError, Result as AppResult};
use crate::models::watch_history::{
    CategoryTrend, CompletionBand, CompletionBucket, CreateWatchHistory, TopContent, UpdateWatchHistory,
    ViewingCategory, WatchAnalytics, WatchHistoryFilter, WatchHistoryRow, estimate_completion,
};

fn to_title() -> RelationDef {
    WatchHistory::belongs_to(Title)
        .from(watch_history::Column::MovieId)
        .to(title::Column::TitleId)
        .into()
}

fn in_range(from: NaiveDate, to: NaiveDate) -> SimpleExpr {
    watch_history::Column::WatchDate.between(from, to)
}

fn filtered_query(filter: &WatchHistoryFilter) -> Select<WatchHistory> {
    let mut query = WatchHistory::find()
        .join(JoinType::LeftJoin, to_title())
        .join(JoinType::LeftJoin, watch_history::Relation::Profile.def())
        .join(JoinType::LeftJoin, profile::Relation::Customer.def())
        .filter(in_range(filter.date_from, filter.date_to));

    if !filter.search.trim().is_empty() {
        query = query.filter(
            Condition::any()
                .add(contains_ci(title::Column::TitleName, &filter.search))
                .add(contains_ci(profile::Column::ProfileName, &filter.search))
                .add(contains_ci(customer::Column::FirstName, &filter.search))
                .add(contains_ci(customer::Column::LastName, &filter.search)),
        );
    }
    if let Some(category) = filter.category {
        query = query.filter(watch_history::Column::ViewingCategory.eq(category.as_str()));
    }
    if let Some(band) = filter.completion {
        let col = watch_history::Column::CompletionPercentage;
        query = query.filter(match band {
            CompletionBand::Complete => col.gt(80.0),
            CompletionBand::Partial => col.between(20.0, 80.0),
            CompletionBand::Sample => col.lt(20.0),
        });
    }
    query
}

/// List one page of watch history, newest first.
///
/// A watch row shared by several profiles is listed once, named after the
/// lowest profile and customer names.
pub async fn list(
    db: &DatabaseConnection,
    filter: &WatchHistoryFilter,
    limit: u64,
    offset: u64,
) -> Result<Vec<WatchHistoryRow>, DbErr> {
    filtered_query(filter)
        .select_only()
        .column_as(watch_history::Column::WatchHistoryId, "watch_history_id")
        .column_as(watch_history::Column::MovieId, "movie_id")
        .column_as(watch_history::Column::WatchDate, "watch_date")
        .column_as(watch_history::Column::DurationWatched, "duration_watched")
        .column_as(watch_history::Column::CompletionPercentage, "completion_percentage")
        .column_as(watch_history::Column::ViewingCategory, "viewing_category")
        .column_as(title::Column::TitleName.min(), "title_name")
        .column_as(profile::Column::ProfileName.min(), "profile_name")
        .column_as(customer::Column::FirstName.min(), "first_name")
        .column_as(customer::Column::LastName.min(), "last_name")
        .group_by(watch_history::Column::WatchHistoryId)
        .group_by(watch_history::Column::MovieId)
        .group_by(watch_history::Column::WatchDate)
        .group_by(watch_history::Column::DurationWatched)
        .group_by(watch_history::Column::CompletionPercentage)
        .group_by(watch_history::Column::ViewingCategory)
        .order_by_desc(watch_history::Column::WatchDate)
        .order_by_desc(watch_history::Column::WatchHistoryId)
        .limit(limit)
        .offset(offset)
        .into_model::<WatchHistoryRow>()
        .all(db)
        .await
}

/// Count watch rows matching the filter.
pub async fn count(db: &DatabaseConnection, filter: &WatchHistoryFilter) -> Result<u64, DbErr> {
    filtered_query(filter)
        .select_only()
        .column(watch_history::Column::WatchHistoryId)
        .distinct()
        .count(db)
        .await
}

/// Get watch history by ID.
pub async fn get_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<watch_history::Model>, DbErr> {
    WatchHistory::find_by_id(id).one(db).await
}

/// Next free watch history id (max + 1).
pub async fn next_id<C: ConnectionTrait>(db: &C) -> Result<i32, DbErr> {
    let max: Option<Option<i32>> = WatchHistory::find()
        .select_only()
        .column_as(watch_history::Column::WatchHistoryId.max(), "max_id")
        .into_tuple()
        .one(db)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

/// Create a watch history record.
pub async fn create(db: &DatabaseConnection, data: CreateWatchHistory) -> AppResult<watch_history::Model> {
    data.validate()?;

    let id = match data.watch_history_id {
        Some(id) => {
            if get_by_id(db, id).await?.is_some() {
                return Err(AppError::validation(format!("Watch history ID {} already exists", id)));
            }
            id
        }
        None => next_id(db).await?,
    };

    let model = watch_history::ActiveModel {
        watch_history_id: Set(id),
        movie_id: Set(data.movie_id),
        watch_date: Set(data.watch_date),
        duration_watched: Set(data.duration_watched),
        completion_percentage: Set(data.completion_percentage),
        viewing_category: Set(Some(data.viewing_category.as_str().to_string())),
    };
    Ok(model.insert(db).await?)
}

/// Update a watch history record.
pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    data: UpdateWatchHistory,
) -> AppResult<Option<watch_history::Model>> {
    data.validate()?;

    let existing = WatchHistory::find_by_id(id).one(db).await?;

    match existing {
        Some(model) => {
            let mut active: watch_history::ActiveModel = model.into();

            if let Some(movie_id) = data.movie_id {
                active.movie_id = Set(movie_id);
            }
            if let Some(watch_date) = data.watch_date {
                active.watch_date = Set(watch_date);
            }
            if let Some(duration_watched) = data.duration_watched {
                active.duration_watched = Set(duration_watched);
            }
            if let Some(completion_percentage) = data.completion_percentage {
                active.completion_percentage = Set(completion_percentage);
            }
            if let Some(category) = data.viewing_category {
                active.viewing_category = Set(Some(category.as_str().to_string()));
            }

            let updated = active.update(db).await?;
            Ok(Some(updated))
        }
        None => Ok(None),
    }
}

/// Delete a watch history record that no profile points at.
pub async fn delete(db: &DatabaseConnection, id: i32) -> AppResult<bool> {
    let referencing = Profile::find()
        .filter(profile::Column::WatchHistoryId.eq(id))
        .count(db)
        .await?;
    if referencing > 0 {
        return Err(AppError::validation(format!(
            "Watch history {} is still used by {} profile(s)",
            id, referencing
        )));
    }

    let result = WatchHistory::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Set the viewing category of a record to Rewatch.
pub async fn mark_rewatch(db: &DatabaseConnection, id: i32) -> AppResult<Option<watch_history::Model>> {
    update(
        db,
        id,
        UpdateWatchHistory {
            viewing_category: Some(ViewingCategory::Rewatch),
            ..Default::default()
        },
    )
    .await
}

/// Running time in minutes of a title, if the catalog knows it.
pub async fn content_duration(db: &DatabaseConnection, movie_id: i32) -> Result<Option<f64>, DbErr> {
    let title = Title::find_by_id(movie_id).one(db).await?;
    Ok(title.and_then(|t| t.duration).map(f64::from))
}

/// Estimate completion for a session, using the title's running time when known.
pub async fn suggest_completion(db: &DatabaseConnection, movie_id: i32, watched_minutes: f64) -> Result<f64, DbErr> {
    let duration = content_duration(db, movie_id).await?;
    Ok(estimate_completion(watched_minutes, duration))
}

/// Titles and names for the movie selector.
pub async fn list_titles(db: &DatabaseConnection) -> Result<Vec<title::Model>, DbErr> {
    Title::find().order_by_asc(title::Column::TitleName).all(db).await
}

/// Aggregate viewing figures and top content between two dates.
pub async fn analytics(db: &DatabaseConnection, from: NaiveDate, to: NaiveDate) -> Result<WatchAnalytics, DbErr> {
    let totals: Option<(i64, Option<f64>, Option<f64>, Option<f64>)> = WatchHistory::find()
        .select_only()
        .column_as(watch_history::Column::WatchHistoryId.count(), "sessions")
        .column_as(watch_history::Column::DurationWatched.sum(), "total_minutes")
        .column_as(
            SimpleExpr::from(Func::avg(Expr::col(watch_history::Column::DurationWatched))),
            "avg_duration",
        )
        .column_as(
            SimpleExpr::from(Func::avg(Expr::col(watch_history::Column::CompletionPercentage))),
            "avg_completion",
        )
        .filter(in_range(from, to))
        .into_tuple()
        .one(db)
        .await?;

    let (sessions, total_minutes, avg_duration, avg_completion) = totals.unwrap_or((0, None, None, None));

    let top_content = WatchHistory::find()
        .join(JoinType::LeftJoin, to_title())
        .select_only()
        .column_as(watch_history::Column::MovieId, "movie_id")
        .column_as(title::Column::TitleName, "title_name")
        .column_as(watch_history::Column::WatchHistoryId.count(), "view_count")
        .column_as(
            SimpleExpr::from(Func::avg(Expr::col((WatchHistory, watch_history::Column::DurationWatched)))),
            "avg_duration",
        )
        .filter(in_range(from, to))
        .group_by(watch_history::Column::MovieId)
        .group_by(title::Column::TitleName)
        .order_by_desc(Expr::cust("view_count"))
        .order_by_asc(watch_history::Column::MovieId)
        .limit(10)
        .into_model::<TopContent>()
        .all(db)
        .await?;

    Ok(WatchAnalytics {
        sessions: sessions as u64,
        total_hours: total_minutes.unwrap_or(0.0) / 60.0,
        avg_duration: avg_duration.unwrap_or(0.0),
        avg_completion: avg_completion.unwrap_or(0.0),
        top_content,
    })
}

/// Session counts per completion bucket between two dates.
pub async fn completion_distribution(
    db: &DatabaseConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(CompletionBucket, u64)>, DbErr> {
    let percentages: Vec<Option<f64>> = WatchHistory::find()
        .select_only()
        .column(watch_history::Column::CompletionPercentage)
        .filter(in_range(from, to))
        .into_tuple()
        .all(db)
        .await?;

    let mut buckets: BTreeMap<CompletionBucket, u64> = BTreeMap::new();
    for pct in percentages {
        *buckets.entry(CompletionBucket::from_percentage(pct)).or_default() += 1;
    }
    Ok(buckets.into_iter().collect())
}

/// Hours watched per day between two dates.
pub async fn daily_hours(
    db: &DatabaseConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(NaiveDate, f64)>, DbErr> {
    let rows: Vec<(NaiveDate, Option<f64>)> = WatchHistory::find()
        .select_only()
        .column(watch_history::Column::WatchDate)
        .column_as(watch_history::Column::DurationWatched.sum(), "total_minutes")
        .filter(in_range(from, to))
        .group_by(watch_history::Column::WatchDate)
        .order_by_asc(watch_history::Column::WatchDate)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(day, minutes)| (day, minutes.unwrap_or(0.0) / 60.0))
        .collect())
}

/// View counts and averages per viewing category between two dates.
pub async fn category_trends(
    db: &DatabaseConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<CategoryTrend>, DbErr> {
    WatchHistory::find()
        .select_only()
        .column_as(watch_history::Column::ViewingCategory, "viewing_category")
        .column_as(watch_history::Column::WatchHistoryId.count(), "total_views")
        .column_as(
            SimpleExpr::from(Func::avg(Expr::col(watch_history::Column::DurationWatched))),
            "avg_duration",
        )
        .column_as(
            SimpleExpr::from(Func::avg(Expr::col(watch_history::Column::CompletionPercentage))),
            "avg_completion",
        )
        .filter(in_range(from, to))
        .group_by(watch_history::Column::ViewingCategory)
        .order_by_desc(Expr::cust("total_views"))
        .into_model::<CategoryTrend>()
        .all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    async fn seeded() -> DatabaseConnection {
        let db = memory_db().await;
        seed_customer(&db, 1, "Tal", "Cohen").await;
        seed_title(&db, 100, "Arrival", Some(116)).await;
        seed_title(&db, 101, "Heat", None).await;
        seed_watch(&db, 1, 100, date(2024, 3, 1), 116.0, Some(100.0)).await;
        seed_watch(&db, 2, 100, date(2024, 3, 2), 58.0, Some(50.0)).await;
        seed_watch(&db, 3, 101, date(2024, 3, 3), 5.0, Some(10.0)).await;
        seed_watch(&db, 4, 101, date(2023, 1, 1), 60.0, None).await;
        seed_profile(&db, 1, "TalKids", 1, 1, false).await;
        db
    }

    fn march() -> WatchHistoryFilter {
        WatchHistoryFilter {
            search: String::new(),
            date_from: date(2024, 3, 1),
            date_to: date(2024, 3, 31),
            category: None,
            completion: None,
        }
    }

    #[tokio::test]
    async fn test_list_paging_and_order() {
        let db = seeded().await;
        let filter = march();

        assert_eq!(count(&db, &filter).await.unwrap(), 3);

        let page = list(&db, &filter, 2, 0).await.unwrap();
        let ids: Vec<i32> = page.iter().map(|r| r.watch_history_id).collect();
        assert_eq!(ids, vec![3, 2]);

        let rest = list(&db, &filter, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title_name.as_deref(), Some("Arrival"));
        assert_eq!(rest[0].customer_name().as_deref(), Some("Tal Cohen"));
    }

    #[tokio::test]
    async fn test_shared_watch_row_listed_once() {
        let db = seeded().await;
        seed_customer(&db, 2, "Dana", "Levi").await;
        seed_profile(&db, 2, "AlsoWatching", 1, 2, false).await;
        seed_profile(&db, 3, "Guest", 1, 2, true).await;
        let filter = march();

        assert_eq!(count(&db, &filter).await.unwrap(), 3);

        let rows = list(&db, &filter, 10, 0).await.unwrap();
        let ids: Vec<i32> = rows.iter().map(|r| r.watch_history_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(rows[2].profile_name.as_deref(), Some("AlsoWatching"));

        let last_page = list(&db, &filter, 2, 2).await.unwrap();
        assert_eq!(last_page.len(), 1);
        assert_eq!(last_page[0].watch_history_id, 1);

        let mut filter = march();
        filter.search = "levi".to_string();
        assert_eq!(count(&db, &filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_and_band_filters() {
        let db = seeded().await;

        let mut filter = march();
        filter.search = "arriv".to_string();
        assert_eq!(count(&db, &filter).await.unwrap(), 2);

        filter.search = "talkids".to_string();
        assert_eq!(count(&db, &filter).await.unwrap(), 1);

        let mut filter = march();
        filter.completion = Some(CompletionBand::Complete);
        assert_eq!(list(&db, &filter, 10, 0).await.unwrap()[0].watch_history_id, 1);
        filter.completion = Some(CompletionBand::Partial);
        assert_eq!(list(&db, &filter, 10, 0).await.unwrap()[0].watch_history_id, 2);
        filter.completion = Some(CompletionBand::Sample);
        assert_eq!(list(&db, &filter, 10, 0).await.unwrap()[0].watch_history_id, 3);

        let mut filter = march();
        filter.category = Some(ViewingCategory::Binge);
        assert_eq!(count(&db, &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_update_and_rewatch() {
        let db = seeded().await;
        let created = create(
            &db,
            CreateWatchHistory {
                watch_history_id: None,
                movie_id: 101,
                watch_date: date(2024, 3, 10),
                duration_watched: 20.0,
                completion_percentage: Some(44.0),
                viewing_category: ViewingCategory::Sample,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.watch_history_id, 5);

        let invalid = UpdateWatchHistory {
            completion_percentage: Some(Some(120.0)),
            ..Default::default()
        };
        assert!(update(&db, 5, invalid).await.is_err());

        let rewatched = mark_rewatch(&db, 5).await.unwrap().unwrap();
        assert_eq!(rewatched.viewing_category.as_deref(), Some("Rewatch"));
    }

    #[tokio::test]
    async fn test_delete_refuses_referenced_rows() {
        let db = seeded().await;
        assert!(matches!(delete(&db, 1).await, Err(AppError::Validation(_))));
        assert!(delete(&db, 4).await.unwrap());
        assert!(!delete(&db, 4).await.unwrap());
    }

    #[tokio::test]
    async fn test_suggest_completion() {
        let db = seeded().await;
        assert!((suggest_completion(&db, 100, 58.0).await.unwrap() - 50.0).abs() < 1e-9);
        // Unknown running time falls back to 45 minutes.
        assert!((suggest_completion(&db, 101, 9.0).await.unwrap() - 20.0).abs() < 1e-9);
        assert!((suggest_completion(&db, 999, 90.0).await.unwrap() - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_analytics() {
        let db = seeded().await;
        let stats = analytics(&db, date(2024, 3, 1), date(2024, 3, 31)).await.unwrap();

        assert_eq!(stats.sessions, 3);
        assert!((stats.total_hours - 179.0 / 60.0).abs() < 1e-9);
        assert!((stats.avg_completion - 160.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.top_content[0].movie_id, 100);
        assert_eq!(stats.top_content[0].view_count, 2);
    }

    #[tokio::test]
    async fn test_distribution_and_trends() {
        let db = seeded().await;
        let dist = completion_distribution(&db, date(2023, 1, 1), date(2024, 12, 31)).await.unwrap();
        assert_eq!(
            dist,
            vec![
                (CompletionBucket::Complete, 1),
                (CompletionBucket::Mostly, 1),
                (CompletionBucket::Sample, 1),
                (CompletionBucket::Unknown, 1),
            ]
        );

        let trends = category_trends(&db, date(2024, 3, 1), date(2024, 3, 31)).await.unwrap();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].viewing_category.as_deref(), Some("Regular"));
        assert_eq!(trends[0].total_views, 3);

        let daily = daily_hours(&db, date(2024, 3, 1), date(2024, 3, 2)).await.unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[1].0, date(2024, 3, 2));
    }
}
