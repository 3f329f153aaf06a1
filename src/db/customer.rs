//! Customer repository with CRUD operations.

use chrono::Local;
use sea_orm::*;

use super::contains_ci;
use crate::entities::{customer, devices, marks_as_favorite, payment, prelude::*, profile, reviews};
use crate::error::{AppError, Result as AppResult};
use crate::models::customer::{CreateCustomer, UpdateCustomer};

fn search_query(search: &str) -> Select<Customer> {
    let mut query = Customer::find();
    if !search.trim().is_empty() {
        query = query.filter(
            Condition::any()
                .add(contains_ci(customer::Column::FirstName, search))
                .add(contains_ci(customer::Column::LastName, search)),
        );
    }
    query
}

/// List customers whose first or last name contains `search`, ordered by id.
pub async fn list(
    db: &DatabaseConnection,
    search: &str,
    limit: Option<u64>,
    offset: u64,
) -> Result<Vec<customer::Model>, DbErr> {
    let mut query = search_query(search)
        .order_by_asc(customer::Column::CustomerId)
        .limit(limit);
    // SQLite only accepts OFFSET after a LIMIT
    if offset > 0 {
        query = query.offset(offset);
    }
    query.all(db).await
}

/// Count customers matching `search`.
pub async fn count(db: &DatabaseConnection, search: &str) -> Result<u64, DbErr> {
    search_query(search).count(db).await
}

/// Get customer by ID.
pub async fn get_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<customer::Model>, DbErr> {
    Customer::find_by_id(id).one(db).await
}

/// Next free customer id (max + 1).
pub async fn next_id<C: ConnectionTrait>(db: &C) -> Result<i32, DbErr> {
    let max: Option<Option<i32>> = Customer::find()
        .select_only()
        .column_as(customer::Column::CustomerId.max(), "max_id")
        .into_tuple()
        .one(db)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

/// Create a new customer.
pub async fn create(db: &DatabaseConnection, data: CreateCustomer) -> AppResult<customer::Model> {
    data.validate(Local::now().date_naive())?;

    let id = match data.customer_id {
        Some(id) => {
            if get_by_id(db, id).await?.is_some() {
                return Err(AppError::validation(format!("Customer ID {} already exists", id)));
            }
            id
        }
        None => next_id(db).await?,
    };

    let model = customer::ActiveModel {
        customer_id: Set(id),
        first_name: Set(data.first_name.trim().to_string()),
        last_name: Set(data.last_name.trim().to_string()),
        date_of_birth: Set(data.date_of_birth),
        customer_since: Set(data.customer_since),
        subscription_type: Set(data.subscription_type),
        payment_status: Set(data.payment_status),
        last_login_date: Set(None),
    };
    Ok(model.insert(db).await?)
}

/// Update an existing customer.
pub async fn update(db: &DatabaseConnection, id: i32, data: UpdateCustomer) -> AppResult<Option<customer::Model>> {
    let existing = Customer::find_by_id(id).one(db).await?;

    match existing {
        Some(model) => {
            data.validate(&model, Local::now().date_naive())?;
            let mut active: customer::ActiveModel = model.into();

            if let Some(first_name) = data.first_name {
                active.first_name = Set(first_name.trim().to_string());
            }
            if let Some(last_name) = data.last_name {
                active.last_name = Set(last_name.trim().to_string());
            }
            if let Some(date_of_birth) = data.date_of_birth {
                active.date_of_birth = Set(date_of_birth);
            }
            if let Some(customer_since) = data.customer_since {
                active.customer_since = Set(customer_since);
            }
            if let Some(subscription_type) = data.subscription_type {
                active.subscription_type = Set(subscription_type);
            }
            if let Some(payment_status) = data.payment_status {
                active.payment_status = Set(payment_status);
            }
            if let Some(last_login_date) = data.last_login_date {
                active.last_login_date = Set(last_login_date);
            }

            let updated = active.update(db).await?;
            Ok(Some(updated))
        }
        None => Ok(None),
    }
}

/// Delete a customer and everything that references it.
///
/// Marks and reviews of the customer's profiles go first, then the profiles,
/// devices and payments, then the customer. Runs in one transaction.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    let profile_ids: Vec<i32> = Profile::find()
        .select_only()
        .column(profile::Column::ProfileId)
        .filter(profile::Column::CustomerId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;

    if !profile_ids.is_empty() {
        MarksAsFavorite::delete_many()
            .filter(marks_as_favorite::Column::ProfileId.is_in(profile_ids.clone()))
            .exec(&txn)
            .await?;
        Reviews::delete_many()
            .filter(reviews::Column::ProfileId.is_in(profile_ids))
            .exec(&txn)
            .await?;
    }

    Profile::delete_many()
        .filter(profile::Column::CustomerId.eq(id))
        .exec(&txn)
        .await?;
    Devices::delete_many()
        .filter(devices::Column::CustomerId.eq(id))
        .exec(&txn)
        .await?;
    Payment::delete_many()
        .filter(payment::Column::CustomerId.eq(id))
        .exec(&txn)
        .await?;

    let result = Customer::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    if result.rows_affected > 0 {
        tracing::info!("Deleted customer {} and dependent rows", id);
    }
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    fn new_customer(first: &str, last: &str) -> CreateCustomer {
        CreateCustomer {
            customer_id: None,
            first_name: first.to_string(),
            last_name: last.to_string(),
            date_of_birth: date(1985, 6, 15),
            customer_since: date(2019, 3, 1),
            subscription_type: Some("Standard".to_string()),
            payment_status: Some("Current".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let db = memory_db().await;
        seed_customer(&db, 10, "Tal", "Cohen").await;

        let created = create(&db, new_customer("Maya", "Shani")).await.unwrap();
        assert_eq!(created.customer_id, 11);
        assert_eq!(next_id(&db).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Tal", "Cohen").await;

        let mut data = new_customer("Maya", "Shani");
        data.customer_id = Some(1);
        assert!(matches!(create(&db, data).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Tal", "Cohen").await;
        seed_customer(&db, 2, "Maya", "Shani").await;
        seed_customer(&db, 3, "Omer", "Cohn").await;

        let found = list(&db, "COH", None, 0).await.unwrap();
        let ids: Vec<i32> = found.iter().map(|c| c.customer_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(count(&db, "coh").await.unwrap(), 2);
        assert_eq!(list(&db, "", Some(1), 1).await.unwrap()[0].customer_id, 2);
    }

    #[tokio::test]
    async fn test_list_without_limit_returns_everything() {
        let db = memory_db().await;
        for id in 1..=4 {
            seed_customer(&db, id, "Noa", "Levi").await;
        }

        assert_eq!(list(&db, "", None, 0).await.unwrap().len(), 4);
        let page: Vec<i32> = list(&db, "levi", Some(2), 2)
            .await
            .unwrap()
            .iter()
            .map(|c| c.customer_id)
            .collect();
        assert_eq!(page, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_update_validates_merged_dates() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Tal", "Cohen").await;

        let bad = UpdateCustomer {
            customer_since: Some(date(1980, 1, 1)),
            ..Default::default()
        };
        assert!(update(&db, 1, bad).await.is_err());

        let good = UpdateCustomer {
            last_name: Some("Levi".to_string()),
            payment_status: Some(Some("Overdue".to_string())),
            ..Default::default()
        };
        let updated = update(&db, 1, good).await.unwrap().unwrap();
        assert_eq!(updated.last_name, "Levi");
        assert_eq!(updated.payment_status.as_deref(), Some("Overdue"));

        assert!(update(&db, 99, UpdateCustomer::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_dependents() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Tal", "Cohen").await;
        seed_customer(&db, 2, "Maya", "Shani").await;
        seed_watch(&db, 1, 100, date(2024, 1, 1), 30.0, Some(50.0)).await;
        seed_watch(&db, 2, 101, date(2024, 1, 2), 30.0, Some(50.0)).await;
        seed_profile(&db, 1, "tal-main", 1, 1, false).await;
        seed_profile(&db, 2, "maya-main", 2, 2, false).await;
        seed_favorite(&db, 100, 60.0).await;
        marks_as_favorite::ActiveModel {
            profile_id: Set(1),
            movie_id: Set(100),
        }
        .insert(&db)
        .await
        .unwrap();
        reviews::ActiveModel {
            movie_id: Set(100),
            rating: Set(4),
            comment: Set("good".to_string()),
            review_date: Set(date(2024, 1, 3)),
            profile_id: Set(1),
        }
        .insert(&db)
        .await
        .unwrap();

        assert!(delete(&db, 1).await.unwrap());

        assert!(get_by_id(&db, 1).await.unwrap().is_none());
        assert_eq!(Profile::find().count(&db).await.unwrap(), 1);
        assert_eq!(MarksAsFavorite::find().count(&db).await.unwrap(), 0);
        assert_eq!(Reviews::find().count(&db).await.unwrap(), 0);
        assert!(!delete(&db, 1).await.unwrap());
    }
}
