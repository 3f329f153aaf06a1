//! Customer DTOs for create and update operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Subscription tiers offered in the customer form.
pub const SUBSCRIPTION_TYPES: &[&str] = &["Basic", "Standard", "Premium"];

/// Payment states offered in the customer form.
pub const PAYMENT_STATUSES: &[&str] = &["Current", "Pending", "Overdue", "Cancelled"];

/// DTO for creating a customer.
///
/// A missing `customer_id` is filled with the next free id by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub customer_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub customer_since: NaiveDate,
    pub subscription_type: Option<String>,
    pub payment_status: Option<String>,
}

/// DTO for updating a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub customer_since: Option<NaiveDate>,
    pub subscription_type: Option<Option<String>>,
    pub payment_status: Option<Option<String>>,
    pub last_login_date: Option<Option<NaiveDate>>,
}

impl CreateCustomer {
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        validate_names(&self.first_name, &self.last_name)?;
        validate_dates(self.date_of_birth, self.customer_since, today)
    }
}

fn validate_names(first: &str, last: &str) -> Result<()> {
    if first.trim().is_empty() {
        return Err(AppError::validation("First name is required"));
    }
    if last.trim().is_empty() {
        return Err(AppError::validation("Last name is required"));
    }
    Ok(())
}

/// Date of birth cannot be in the future and must precede the customer-since date.
pub fn validate_dates(date_of_birth: NaiveDate, customer_since: NaiveDate, today: NaiveDate) -> Result<()> {
    if date_of_birth > today {
        return Err(AppError::validation("Date of birth cannot be in the future"));
    }
    if customer_since < date_of_birth {
        return Err(AppError::validation("Customer since date cannot be before date of birth"));
    }
    Ok(())
}

impl UpdateCustomer {
    /// Validate the fields being changed, merged over the current values.
    pub fn validate(&self, current: &crate::entities::customer::Model, today: NaiveDate) -> Result<()> {
        let first = self.first_name.as_deref().unwrap_or(&current.first_name);
        let last = self.last_name.as_deref().unwrap_or(&current.last_name);
        validate_names(first, last)?;
        validate_dates(
            self.date_of_birth.unwrap_or(current.date_of_birth),
            self.customer_since.unwrap_or(current.customer_since),
            today,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> CreateCustomer {
        CreateCustomer {
            customer_id: None,
            first_name: "Dana".to_string(),
            last_name: "Levi".to_string(),
            date_of_birth: date(1990, 5, 1),
            customer_since: date(2020, 1, 1),
            subscription_type: Some("Premium".to_string()),
            payment_status: None,
        }
    }

    #[test]
    fn test_valid_customer() {
        assert!(sample().validate(date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut c = sample();
        c.last_name = "  ".to_string();
        assert!(matches!(c.validate(date(2024, 1, 1)), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_future_birth_date_rejected() {
        let c = sample();
        assert!(c.validate(date(1980, 1, 1)).is_err());
    }

    #[test]
    fn test_since_before_birth_rejected() {
        let mut c = sample();
        c.customer_since = date(1989, 1, 1);
        assert!(c.validate(date(2024, 1, 1)).is_err());
    }
}
