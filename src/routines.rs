//! Stored functions and procedures exposed on the routines screen.
//!
//! Routine names come only from [`ROUTINES`]; user input is parsed per
//! parameter and bound as `$n` values.

use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use chrono::{DateTime, Local};
use sea_orm::*;

use crate::error::{AppError, Result as AppResult};
use crate::reports::Cell;

/// Function (returns a scalar) or procedure (`CALL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoutineKind {
    Function,
    Procedure,
}

impl RoutineKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::Procedure => "Procedure",
        }
    }
}

/// Parameter type used to parse form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
    Text,
}

impl ParamKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "varchar",
        }
    }

    /// Parse raw form input into a bindable value.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("value is required".to_string());
        }
        match self {
            Self::Int => raw
                .parse::<i32>()
                .map(Value::from)
                .map_err(|_| format!("'{}' is not a whole number", raw)),
            Self::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::from)
                .ok_or_else(|| format!("'{}' is not a number", raw)),
            Self::Text => Ok(Value::from(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub label: &'static str,
}

const fn param(name: &'static str, kind: ParamKind, label: &'static str) -> ParamSpec {
    ParamSpec { name, kind, label }
}

/// A stored routine the admin can call.
#[derive(Debug, Clone, Copy)]
pub struct Routine {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub kind: RoutineKind,
    pub params: &'static [ParamSpec],
}

pub static ROUTINES: &[Routine] = &[
    Routine {
        name: "get_customer_total_watch_time",
        title: "Get Customer Total Watch Time",
        description: "Calculate total watch time for a specific customer",
        kind: RoutineKind::Function,
        params: &[param("customer_id", ParamKind::Int, "Customer ID")],
    },
    Routine {
        name: "calculate_completion_rate",
        title: "Calculate Content Completion Rate",
        description: "Calculate average completion rate for specific content",
        kind: RoutineKind::Function,
        params: &[param("movie_id", ParamKind::Int, "Movie ID")],
    },
    Routine {
        name: "get_monthly_revenue",
        title: "Get Monthly Revenue",
        description: "Calculate total revenue for a specific month",
        kind: RoutineKind::Function,
        params: &[
            param("year", ParamKind::Int, "Year"),
            param("month", ParamKind::Int, "Month"),
        ],
    },
    Routine {
        name: "count_active_profiles",
        title: "Count Active Profiles",
        description: "Count active profiles for a customer",
        kind: RoutineKind::Function,
        params: &[param("customer_id", ParamKind::Int, "Customer ID")],
    },
    Routine {
        name: "update_customer_subscription",
        title: "Update Customer Subscription",
        description: "Update customer subscription type and payment status",
        kind: RoutineKind::Procedure,
        params: &[
            param("customer_id", ParamKind::Int, "Customer ID"),
            param("new_subscription", ParamKind::Text, "New Subscription Type"),
            param("new_status", ParamKind::Text, "New Payment Status"),
        ],
    },
    Routine {
        name: "cleanup_inactive_profiles",
        title: "Cleanup Inactive Profiles",
        description: "Remove profiles that haven't been active for the given number of days",
        kind: RoutineKind::Procedure,
        params: &[param("days_inactive", ParamKind::Int, "Days of inactivity")],
    },
    Routine {
        name: "generate_monthly_report",
        title: "Generate Monthly Report",
        description: "Generate a monthly usage report",
        kind: RoutineKind::Procedure,
        params: &[
            param("year", ParamKind::Int, "Year"),
            param("month", ParamKind::Int, "Month"),
        ],
    },
    Routine {
        name: "backup_customer_data",
        title: "Backup Customer Data",
        description: "Create a backup of a customer and related data",
        kind: RoutineKind::Procedure,
        params: &[param("customer_id", ParamKind::Int, "Customer ID")],
    },
];

impl Routine {
    pub fn functions() -> impl Iterator<Item = &'static Routine> {
        ROUTINES.iter().filter(|r| r.kind == RoutineKind::Function)
    }

    pub fn procedures() -> impl Iterator<Item = &'static Routine> {
        ROUTINES.iter().filter(|r| r.kind == RoutineKind::Procedure)
    }

    pub fn find(name: &str) -> Option<&'static Routine> {
        ROUTINES.iter().find(|r| r.name == name)
    }

    /// SQL text with one placeholder per parameter.
    pub fn sql(&self) -> String {
        let placeholders = (1..=self.params.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        match self.kind {
            RoutineKind::Function => format!("SELECT {}({})", self.name, placeholders),
            RoutineKind::Procedure => format!("CALL {}({})", self.name, placeholders),
        }
    }

    /// Parse form inputs, one per parameter in order.
    pub fn parse_args(&self, inputs: &[String]) -> AppResult<Vec<Value>> {
        if inputs.len() != self.params.len() {
            return Err(AppError::validation(format!(
                "{} expects {} parameter(s), got {}",
                self.title,
                self.params.len(),
                inputs.len()
            )));
        }
        self.params
            .iter()
            .zip(inputs)
            .map(|(spec, raw)| {
                spec.kind
                    .parse(raw)
                    .map_err(|e| AppError::validation(format!("{}: {}", spec.label, e)))
            })
            .collect()
    }

    pub fn statement(&self, backend: DbBackend, args: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(backend, self.sql(), args)
    }

    /// Human readable definition for the "View SQL" window.
    pub fn signature(&self) -> String {
        let mut text = format!("-- {}\n-- {}\n\n", self.title, self.description);
        for spec in self.params {
            text.push_str(&format!("-- {} ({}): {}\n", spec.name, spec.kind.label(), spec.label));
        }
        text.push('\n');
        text.push_str(&self.sql());
        text
    }
}

/// Call a routine with raw form inputs and return the displayable result.
pub async fn execute(db: &DatabaseConnection, routine: &Routine, inputs: &[String]) -> AppResult<String> {
    let args = routine.parse_args(inputs)?;
    let stmt = routine.statement(db.get_database_backend(), args);
    tracing::info!("Calling {} {}", routine.kind.label().to_lowercase(), routine.name);

    match routine.kind {
        RoutineKind::Function => {
            let row = db.query_one(stmt).await?;
            Ok(row
                .map(|row| Cell::decode(&row, 0).to_string())
                .unwrap_or_else(|| Cell::Null.to_string()))
        }
        RoutineKind::Procedure => {
            let txn = db.begin().await?;
            txn.execute(stmt).await?;
            txn.commit().await?;
            Ok("Success".to_string())
        }
    }
}

/// One call in the execution log.
#[derive(Debug, Clone)]
pub struct ExecutionEntry {
    pub executed_at: DateTime<Local>,
    pub kind: RoutineKind,
    pub name: String,
    pub params: Vec<String>,
    pub outcome: std::result::Result<String, String>,
    pub elapsed_ms: u128,
}

/// Aggregated calls for one routine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoutineStats {
    pub calls: usize,
    pub failures: usize,
    pub average_ms: f64,
}

/// Bounded log of routine calls, newest first.
#[derive(Debug, Clone)]
pub struct ExecutionLog {
    entries: VecDeque<ExecutionEntry>,
    capacity: usize,
}

impl Default for ExecutionLog {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: 100,
        }
    }
}

impl ExecutionLog {
    pub fn record(&mut self, routine: &Routine, params: &[String], outcome: std::result::Result<String, String>, started: Instant) {
        self.entries.push_front(ExecutionEntry {
            executed_at: Local::now(),
            kind: routine.kind,
            name: routine.title.to_string(),
            params: params.to_vec(),
            outcome,
            elapsed_ms: started.elapsed().as_millis(),
        });
        self.entries.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Per-routine call counts, failures and average time, keyed by kind and name.
    pub fn statistics(&self) -> BTreeMap<(RoutineKind, String), RoutineStats> {
        let mut totals: BTreeMap<(RoutineKind, String), (usize, usize, u128)> = BTreeMap::new();
        for entry in &self.entries {
            let slot = totals.entry((entry.kind, entry.name.clone())).or_default();
            slot.0 += 1;
            if entry.outcome.is_err() {
                slot.1 += 1;
            }
            slot.2 += entry.elapsed_ms;
        }

        totals
            .into_iter()
            .map(|(key, (calls, failures, total_ms))| {
                let stats = RoutineStats {
                    calls,
                    failures,
                    average_ms: total_ms as f64 / calls as f64,
                };
                (key, stats)
            })
            .collect()
    }

    /// Overall success rate in percent, `None` before any call.
    pub fn success_rate(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let ok = self.entries.iter().filter(|e| e.outcome.is_ok()).count();
        Some(ok as f64 * 100.0 / self.entries.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;

    fn inputs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| String::from(*v)).collect()
    }

    #[test]
    fn test_catalog_split() {
        assert_eq!(Routine::functions().count(), 4);
        assert_eq!(Routine::procedures().count(), 4);
        assert!(Routine::find("backup_customer_data").is_some());
    }

    #[test]
    fn test_sql_uses_placeholders() {
        let revenue = Routine::find("get_monthly_revenue").unwrap();
        assert_eq!(revenue.sql(), "SELECT get_monthly_revenue($1, $2)");

        let update = Routine::find("update_customer_subscription").unwrap();
        assert_eq!(update.sql(), "CALL update_customer_subscription($1, $2, $3)");
        assert!(update.signature().contains("new_status (varchar)"));
    }

    #[test]
    fn test_parse_args() {
        let update = Routine::find("update_customer_subscription").unwrap();
        let args = update.parse_args(&inputs(&["7", "Premium", "Current"])).unwrap();
        assert_eq!(args[0], Value::from(7));
        assert_eq!(args[1], Value::from("Premium".to_string()));

        assert!(update.parse_args(&inputs(&["x", "Premium", "Current"])).is_err());
        assert!(update.parse_args(&inputs(&["7", "", "Current"])).is_err());
        assert!(update.parse_args(&inputs(&["7"])).is_err());
    }

    #[test]
    fn test_param_kind_parse() {
        assert!(ParamKind::Int.parse("12.5").is_err());
        assert_eq!(ParamKind::Float.parse(" 12.5 ").unwrap(), Value::from(12.5));
        assert!(ParamKind::Float.parse("NaN").is_err());
        assert!(ParamKind::Text.parse("   ").is_err());
    }

    #[test]
    fn test_statistics() {
        let mut log = ExecutionLog::default();
        let revenue = Routine::find("get_monthly_revenue").unwrap();
        let backup = Routine::find("backup_customer_data").unwrap();

        log.record(revenue, &inputs(&["2024", "1"]), Ok("10.00".into()), Instant::now());
        log.record(revenue, &inputs(&["2024", "2"]), Err("boom".into()), Instant::now());
        log.record(backup, &inputs(&["1"]), Ok("Success".into()), Instant::now());

        let stats = log.statistics();
        let revenue_stats = stats[&(RoutineKind::Function, revenue.title.to_string())];
        assert_eq!(revenue_stats.calls, 2);
        assert_eq!(revenue_stats.failures, 1);
        assert_eq!(stats.len(), 2);

        let rate = log.success_rate().unwrap();
        assert!((rate - 66.666).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_input_before_calling() {
        let db = memory_db().await;
        let routine = Routine::find("count_active_profiles").unwrap();
        let err = execute(&db, routine, &inputs(&["abc"])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
