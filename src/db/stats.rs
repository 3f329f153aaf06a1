//! Dashboard statistics.

use chrono::{Datelike, Duration, Local, NaiveDate};
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::*;

use crate::entities::{customer, payment, prelude::*, profile, reviews, title, watch_history};
use crate::models::profile::AccountStatus;
use crate::models::stats::{ActivityRow, DashboardStats};

/// Load every dashboard figure as of `today`.
pub async fn load_dashboard(db: &DatabaseConnection, today: NaiveDate) -> Result<DashboardStats, DbErr> {
    let customers = Customer::find().count(db).await?;
    let active_profiles = Profile::find()
        .filter(profile::Column::AccountStatus.eq(AccountStatus::Active.as_str()))
        .count(db)
        .await?;
    let online_profiles = Profile::find()
        .filter(profile::Column::IsOnline.eq(true))
        .count(db)
        .await?;
    let total_content = Title::find().count(db).await?;
    let sessions_last_24h = WatchHistory::find()
        .filter(watch_history::Column::WatchDate.gte(today - Duration::days(1)))
        .count(db)
        .await?;

    let total_minutes: Option<Option<f64>> = WatchHistory::find()
        .select_only()
        .column_as(watch_history::Column::DurationWatched.sum(), "total")
        .into_tuple()
        .one(db)
        .await?;

    let month_start = today.with_day(1).unwrap_or(today);
    let monthly_revenue: Option<Option<f64>> = Payment::find()
        .select_only()
        .column_as(payment::Column::Amount.sum(), "total")
        .filter(payment::Column::PaymentDate.gte(month_start))
        .into_tuple()
        .one(db)
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
        .into_tuple()
        .one(db)
        .await?;

    let average_completion: Option<Option<f64>> = WatchHistory::find()
        .select_only()
        .column_as(
            SimpleExpr::from(Func::avg(Expr::col(watch_history::Column::CompletionPercentage))),
            "avg_completion",
        )
        .filter(watch_history::Column::CompletionPercentage.gt(0.0))
        .into_tuple()
        .one(db)
        .await?;

    let recent_activity = recent_activity(db, today).await?;

    Ok(DashboardStats {
        customers,
        active_profiles,
        online_profiles,
        total_content,
        sessions_last_24h,
        total_hours: total_minutes.flatten().unwrap_or(0.0) / 60.0,
        monthly_revenue: monthly_revenue.flatten().unwrap_or(0.0),
        average_rating: average_rating.flatten().unwrap_or(0.0),
        average_completion: average_completion.flatten().unwrap_or(0.0),
        recent_activity,
    })
}

/// The 20 most recent sessions from the last 7 days.
pub async fn recent_activity(db: &DatabaseConnection, today: NaiveDate) -> Result<Vec<ActivityRow>, DbErr> {
    let to_title: RelationDef = WatchHistory::belongs_to(Title)
        .from(watch_history::Column::MovieId)
        .to(title::Column::TitleId)
        .into();

    WatchHistory::find()
        .join(JoinType::LeftJoin, to_title)
        .join(JoinType::LeftJoin, watch_history::Relation::Profile.def())
        .join(JoinType::LeftJoin, profile::Relation::Customer.def())
        .select_only()
        .column_as(watch_history::Column::WatchDate, "watch_date")
        .column_as(watch_history::Column::DurationWatched, "duration_watched")
        .column_as(title::Column::TitleName, "title_name")
        .column_as(customer::Column::FirstName, "first_name")
        .column_as(customer::Column::LastName, "last_name")
        .filter(watch_history::Column::WatchDate.gte(today - Duration::days(7)))
        .order_by_desc(watch_history::Column::WatchDate)
        .limit(20)
        .into_model::<ActivityRow>()
        .all(db)
        .await
}

/// Convenience wrapper using the local date.
pub async fn load_dashboard_now(db: &DatabaseConnection) -> Result<DashboardStats, DbErr> {
    load_dashboard(db, Local::now().date_naive()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    #[tokio::test]
    async fn test_empty_database() {
        let db = memory_db().await;
        let stats = load_dashboard(&db, date(2024, 6, 15)).await.unwrap();
        assert_eq!(stats, DashboardStats::default());
    }

    #[tokio::test]
    async fn test_dashboard_figures() {
        let db = memory_db().await;
        let today = date(2024, 6, 15);
        seed_customer(&db, 1, "Tal", "Cohen").await;
        seed_title(&db, 100, "Arrival", Some(116)).await;
        seed_watch(&db, 1, 100, today, 90.0, Some(80.0)).await;
        seed_watch(&db, 2, 100, date(2024, 6, 10), 30.0, Some(20.0)).await;
        seed_watch(&db, 3, 100, date(2024, 1, 1), 60.0, Some(0.0)).await;
        seed_profile(&db, 1, "TalKids", 1, 1, true).await;
        seed_profile(&db, 2, "TalMain", 2, 1, false).await;

        for (id, day, amount) in [(1, date(2024, 6, 2), 9.99), (2, date(2024, 5, 30), 50.0)] {
            payment::ActiveModel {
                payment_id: Set(id),
                payment_date: Set(day),
                amount: Set(amount),
                currency: Set("USD".to_string()),
                payment_method: Set("Card".to_string()),
                status: Set("Completed".to_string()),
                customer_id: Set(1),
            }
            .insert(&db)
            .await
            .unwrap();
        }
        reviews::ActiveModel {
            movie_id: Set(100),
            rating: Set(4),
            comment: Set(String::new()),
            review_date: Set(today),
            profile_id: Set(1),
        }
        .insert(&db)
        .await
        .unwrap();

        let stats = load_dashboard(&db, today).await.unwrap();
        assert_eq!(stats.customers, 1);
        assert_eq!(stats.active_profiles, 2);
        assert_eq!(stats.online_profiles, 1);
        assert_eq!(stats.total_content, 1);
        assert_eq!(stats.sessions_last_24h, 1);
        assert!((stats.total_hours - 3.0).abs() < 1e-9);
        assert!((stats.monthly_revenue - 9.99).abs() < 1e-9);
        assert!((stats.average_rating - 4.0).abs() < 1e-9);
        // Zero-completion sessions are excluded from the average.
        assert!((stats.average_completion - 50.0).abs() < 1e-9);

        assert_eq!(stats.recent_activity.len(), 2);
        assert_eq!(stats.recent_activity[0].user(), "Tal Cohen");
        assert_eq!(stats.recent_activity[0].title_name.as_deref(), Some("Arrival"));
    }
}
