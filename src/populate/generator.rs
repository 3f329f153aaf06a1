//! Random mock data confined to one source's id plan.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::dataset::*;
use super::plan::IdPlan;
use crate::models::customer::{PAYMENT_STATUSES, SUBSCRIPTION_TYPES};
use crate::models::profile::AccountStatus;
use crate::models::watch_history::{ViewingCategory, estimate_completion};

const FIRST_NAMES: &[&str] = &[
    "Avery", "Blake", "Casey", "Dana", "Eden", "Finley", "Gray", "Harper", "Indie", "Jordan", "Kai", "Logan",
    "Morgan", "Noa", "Oakley", "Parker", "Quinn", "Reese", "Sage", "Taylor",
];
const LAST_NAMES: &[&str] = &[
    "Adler", "Brooks", "Cohen", "Diaz", "Ellis", "Fischer", "Garcia", "Hughes", "Ito", "Jensen", "Khan", "Levi",
    "Mills", "Novak", "Ortiz", "Patel", "Rossi", "Silva", "Tanaka", "Weiss",
];
const DEVICE_NAMES: &[&str] = &["Mobile", "Laptop", "TV", "Tablet", "Game Console"];
const DEVICE_TYPES: &[&str] = &["iOS", "Android", "Windows", "macOS", "SmartTV"];
const CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "CAD"];
const PAYMENT_METHODS: &[&str] = &["Credit Card", "PayPal", "Bank Transfer", "Apple Pay", "Google Pay"];
const PAYMENT_RESULTS: &[&str] = &["Completed", "Pending", "Failed"];
const COMMENTS: &[&str] = &[
    "Loved it",
    "Would watch again",
    "Too long",
    "Great cast",
    "Not my thing",
    "Surprisingly good",
];

/// Movie ids referenced by watch history; titles may or may not exist for them.
const MOVIE_ID_MAX: i32 = 1000;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Generates a self-contained [`Dataset`] per source.
pub struct MockGenerator<R: Rng = StdRng> {
    rng: R,
    today: NaiveDate,
}

impl MockGenerator<StdRng> {
    /// Reproducible generator for tests and repeatable fixture files.
    pub fn seeded(seed: u64, today: NaiveDate) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            today,
        }
    }

    pub fn from_os_rng(today: NaiveDate) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            today,
        }
    }
}

impl<R: Rng> MockGenerator<R> {
    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn days_ago(&mut self, max_days: i64) -> NaiveDate {
        self.today - Duration::days(self.rng.random_range(0..=max_days))
    }

    fn date_between(&mut self, from: NaiveDate, to: NaiveDate) -> NaiveDate {
        let span = (to - from).num_days().max(0);
        from + Duration::days(self.rng.random_range(0..=span))
    }

    /// Build every table for `plan`. Foreign keys only point at rows in the result.
    pub fn generate(&mut self, plan: &IdPlan) -> Dataset {
        let label = plan.source.label();
        let ids: Vec<i32> = plan.rows.ids().collect();

        let customers: Vec<CustomerRecord> = ids
            .iter()
            .map(|&id| {
                let dob_from = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap_or(self.today);
                let dob_to = self.today - Duration::days(365 * 18);
                let since_from = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or(self.today);
                CustomerRecord {
                    first_name: format!("{}{}", label, self.pick(FIRST_NAMES)),
                    last_name: self.pick(LAST_NAMES).to_string(),
                    customer_id: id,
                    date_of_birth: self.date_between(dob_from, dob_to),
                    customer_since: self.date_between(since_from, self.today),
                    subscription_type: Some(self.pick(SUBSCRIPTION_TYPES).to_string()),
                    payment_status: Some(self.pick(PAYMENT_STATUSES).to_string()),
                }
            })
            .collect();

        let mut devices = Vec::new();
        let mut device_ids = plan.devices.ids();
        for customer in &customers {
            let count = self.rng.random_range(1..=super::plan::MAX_DEVICES_PER_CUSTOMER);
            for j in 0..count {
                let Some(device_id) = device_ids.next() else { break };
                devices.push(DeviceRecord {
                    device_name: format!("{}_{}", self.pick(DEVICE_NAMES), j),
                    device_id,
                    last_seen: self.days_ago(365),
                    device_type: self.pick(DEVICE_TYPES).to_string(),
                    customer_id: customer.customer_id,
                });
            }
        }

        let watch_history: Vec<WatchHistoryRecord> = ids
            .iter()
            .map(|&id| {
                let duration = round2(self.rng.random_range(10.0..180.0));
                let category = *ViewingCategory::ALL.choose(&mut self.rng).unwrap_or(&ViewingCategory::Regular);
                let content = self.rng.random_range(30.0..200.0);
                WatchHistoryRecord {
                    movie_id: self.rng.random_range(1..=MOVIE_ID_MAX),
                    watch_date: self.days_ago(365),
                    duration_watched: duration,
                    watch_history_id: id,
                    completion_percentage: Some(round2(estimate_completion(duration, Some(content)))),
                    viewing_category: Some(category.as_str().to_string()),
                }
            })
            .collect();

        let favorites: Vec<FavoriteRecord> = ids
            .iter()
            .map(|&id| FavoriteRecord {
                movie_id: id,
                last_seen: self.days_ago(365),
                total_time_watched: round2(self.rng.random_range(60.0..600.0)),
            })
            .collect();

        let customer_ids: Vec<i32> = customers.iter().map(|c| c.customer_id).collect();

        let payments: Vec<PaymentRecord> = ids
            .iter()
            .map(|&id| PaymentRecord {
                payment_id: id,
                payment_date: self.days_ago(365),
                amount: round2(self.rng.random_range(5.0..50.0)),
                currency: self.pick(CURRENCIES).to_string(),
                payment_method: self.pick(PAYMENT_METHODS).to_string(),
                status: self.pick(PAYMENT_RESULTS).to_string(),
                customer_id: *customer_ids.choose(&mut self.rng).unwrap_or(&id),
            })
            .collect();

        // One profile per watch-history row.
        let profiles: Vec<ProfileRecord> = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let status = *AccountStatus::ALL.choose(&mut self.rng).unwrap_or(&AccountStatus::Active);
                ProfileRecord {
                    profile_name: format!("{}Profile{}", label, i),
                    profile_picture: format!("avatar_{}.png", id),
                    is_online: self.rng.random_bool(0.3),
                    profile_id: id,
                    watch_history_id: id,
                    customer_id: *customer_ids.choose(&mut self.rng).unwrap_or(&id),
                    account_status: Some(status.as_str().to_string()),
                }
            })
            .collect();

        let profile_ids: Vec<i32> = profiles.iter().map(|p| p.profile_id).collect();

        let reviews: Vec<ReviewRecord> = ids
            .iter()
            .map(|&id| ReviewRecord {
                rating: self.rng.random_range(1..=5),
                movie_id: id,
                comment: self.pick(COMMENTS).to_string(),
                review_date: self.days_ago(365),
                profile_id: *profile_ids.choose(&mut self.rng).unwrap_or(&id),
            })
            .collect();

        let favorite_ids: Vec<i32> = favorites.iter().map(|f| f.movie_id).collect();
        let mut seen = HashSet::new();
        let mut marks = Vec::with_capacity(ids.len());
        while marks.len() < ids.len() {
            let (Some(&profile_id), Some(&movie_id)) =
                (profile_ids.choose(&mut self.rng), favorite_ids.choose(&mut self.rng))
            else {
                break;
            };
            let mark = MarkRecord { profile_id, movie_id };
            if seen.insert(mark.clone()) {
                marks.push(mark);
            }
        }

        Dataset {
            customers,
            devices,
            watch_history,
            favorites,
            payments,
            profiles,
            reviews,
            marks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populate::plan::Source;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_dataset_is_self_contained() {
        for plan in IdPlan::split(400) {
            let dataset = MockGenerator::seeded(7, today()).generate(&plan);
            assert!(dataset.integrity_problems().is_empty(), "{:?}", dataset.integrity_problems());
            assert_eq!(dataset.customers.len() as u32, plan.rows.len);
            assert_eq!(dataset.marks.len() as u32, plan.rows.len);
        }
    }

    #[test]
    fn test_ids_stay_in_plan() {
        let plan = IdPlan::split(400)[1];
        assert_eq!(plan.source, Source::Excel);
        let dataset = MockGenerator::seeded(1, today()).generate(&plan);

        assert!(dataset.customers.iter().all(|c| plan.rows.contains(c.customer_id)));
        assert!(dataset.devices.iter().all(|d| plan.devices.contains(d.device_id)));
        assert!(dataset.reviews.iter().all(|r| plan.rows.contains(r.movie_id)));
        assert!(dataset.customers.iter().all(|c| c.first_name.starts_with("Excel")));
    }

    #[test]
    fn test_devices_per_customer() {
        let plan = IdPlan::split(400)[0];
        let dataset = MockGenerator::seeded(3, today()).generate(&plan);
        for customer in &dataset.customers {
            let count = dataset
                .devices
                .iter()
                .filter(|d| d.customer_id == customer.customer_id)
                .count();
            assert!((1..=3).contains(&count));
        }
    }

    #[test]
    fn test_values_in_range() {
        let plan = IdPlan::split(30)[2];
        let dataset = MockGenerator::seeded(11, today()).generate(&plan);
        assert!(dataset.reviews.iter().all(|r| (1..=5).contains(&r.rating)));
        assert!(dataset.watch_history.iter().all(|w| {
            let pct = w.completion_percentage.unwrap_or_default();
            w.watch_date <= today() && (0.0..=100.0).contains(&pct)
        }));
        assert!(dataset.customers.iter().all(|c| c.date_of_birth < c.customer_since));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let plan = IdPlan::split(60)[0];
        let a = MockGenerator::seeded(42, today()).generate(&plan);
        let b = MockGenerator::seeded(42, today()).generate(&plan);
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_row_plan() {
        let plan = IdPlan::split(3)[0];
        let dataset = MockGenerator::seeded(5, today()).generate(&plan);
        assert_eq!(dataset.marks.len(), 1);
        assert!(dataset.integrity_problems().is_empty());
    }
}
