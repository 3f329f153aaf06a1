//! Ad hoc SQL entered on the custom query tab.

use std::collections::VecDeque;
use std::time::Instant;

use chrono::{DateTime, Local};
use sea_orm::*;

use super::result::ResultTable;
use crate::error::{AppError, Result as AppResult};

/// How a statement is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Returns rows (SELECT / WITH).
    Query,
    /// Modifies data or schema; runs in a transaction.
    Command,
}

/// Text after any leading whitespace and `--` or `/* */` comments.
fn skip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(line) = rest.strip_prefix("--") {
            rest = line.split_once('\n').map(|(_, after)| after).unwrap_or("").trim_start();
        } else if let Some(block) = rest.strip_prefix("/*") {
            rest = block.split_once("*/").map(|(_, after)| after).unwrap_or("").trim_start();
        } else {
            return rest;
        }
    }
}

/// Classify by the first keyword after any leading comments.
pub fn classify(sql: &str) -> StatementKind {
    let first = skip_leading_comments(sql)
        .split(|c: char| c.is_whitespace() || c == '(')
        .find(|word| !word.is_empty())
        .unwrap_or_default()
        .to_ascii_uppercase();

    match first.as_str() {
        "SELECT" | "WITH" => StatementKind::Query,
        _ => StatementKind::Command,
    }
}

/// Result of running custom SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomOutcome {
    Rows(ResultTable),
    Affected(u64),
}

impl CustomOutcome {
    /// Short status line for the results area.
    pub fn summary(&self) -> String {
        match self {
            Self::Rows(table) => format!("{} row(s) returned", table.row_count()),
            Self::Affected(n) => format!("{} row(s) affected", n),
        }
    }
}

fn non_empty(sql: &str) -> AppResult<&str> {
    let sql = sql.trim().trim_end_matches(';').trim();
    if sql.is_empty() {
        return Err(AppError::validation("Enter a SQL statement first"));
    }
    Ok(sql)
}

/// Run custom SQL. Queries return a table; anything else is committed atomically.
pub async fn run_custom(db: &DatabaseConnection, sql: &str) -> AppResult<CustomOutcome> {
    let sql = non_empty(sql)?;
    let backend = db.get_database_backend();

    match classify(sql) {
        StatementKind::Query => {
            let rows = db.query_all(Statement::from_string(backend, sql)).await?;
            Ok(CustomOutcome::Rows(ResultTable::from_rows(&rows)))
        }
        StatementKind::Command => {
            let txn = db.begin().await?;
            let result = txn.execute_unprepared(sql).await?;
            txn.commit().await?;
            tracing::info!("Custom statement affected {} row(s)", result.rows_affected());
            Ok(CustomOutcome::Affected(result.rows_affected()))
        }
    }
}

/// Check a query by asking the server to plan it. Only queries can be validated.
pub async fn validate(db: &DatabaseConnection, sql: &str) -> AppResult<Vec<String>> {
    let sql = non_empty(sql)?;
    if classify(sql) != StatementKind::Query {
        return Err(AppError::validation(
            "Only SELECT statements can be validated without executing them",
        ));
    }

    let backend = db.get_database_backend();
    let rows = db
        .query_all(Statement::from_string(backend, format!("EXPLAIN {}", sql)))
        .await?;
    let plan = ResultTable::from_rows(&rows)
        .rows
        .into_iter()
        .map(|row| row.iter().map(ToString::to_string).collect::<Vec<_>>().join(" "))
        .collect();
    Ok(plan)
}

/// Execute a prepared statement and decode the rows, measuring elapsed time.
pub async fn run_statement(
    db: &DatabaseConnection,
    stmt: Statement,
    headers: &[&str],
) -> Result<(ResultTable, u128), DbErr> {
    let started = Instant::now();
    let rows = db.query_all(stmt).await?;
    let table = ResultTable::with_headers(&rows, headers);
    Ok((table, started.elapsed().as_millis()))
}

/// One executed query.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub executed_at: DateTime<Local>,
    pub label: String,
    pub elapsed_ms: u128,
    /// Row count or error text.
    pub outcome: std::result::Result<String, String>,
}

/// Most recent executions, newest first.
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::with_capacity(50)
    }
}

impl QueryHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(
        &mut self,
        label: impl Into<String>,
        elapsed_ms: u128,
        outcome: std::result::Result<String, String>,
    ) {
        self.entries.push_front(HistoryEntry {
            executed_at: Local::now(),
            label: label.into(),
            elapsed_ms,
            outcome,
        });
        self.entries.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{memory_db, seed_customer};
    use crate::entities::prelude::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("select * from customer"), StatementKind::Query);
        assert_eq!(classify("  WITH x AS (SELECT 1) SELECT * FROM x"), StatementKind::Query);
        assert_eq!(classify("-- recent\nSELECT 1"), StatementKind::Query);
        assert_eq!(classify("(SELECT 1)"), StatementKind::Query);
        assert_eq!(classify("UPDATE customer SET firstname = 'x'"), StatementKind::Command);
        assert_eq!(classify(""), StatementKind::Command);
    }

    #[test]
    fn test_classify_skips_block_comments() {
        assert_eq!(classify("/* note */ SELECT 1"), StatementKind::Query);
        assert_eq!(
            classify("/* header\n   spans lines */\n-- and a line\nWITH x AS (SELECT 1) SELECT * FROM x"),
            StatementKind::Query
        );
        assert_eq!(classify("/* SELECT */ DELETE FROM customer"), StatementKind::Command);
        assert_eq!(classify("/* unterminated SELECT"), StatementKind::Command);
    }

    #[tokio::test]
    async fn test_run_custom_query_and_command() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Ann", "Lee").await;
        seed_customer(&db, 2, "Bo", "Kim").await;

        let outcome = run_custom(&db, "SELECT customerid FROM customer ORDER BY customerid;")
            .await
            .unwrap();
        match outcome {
            CustomOutcome::Rows(table) => assert_eq!(table.row_count(), 2),
            other => panic!("expected rows, got {:?}", other),
        }

        let outcome = run_custom(&db, "UPDATE customer SET firstname = 'Zed'").await.unwrap();
        assert_eq!(outcome, CustomOutcome::Affected(2));
        assert_eq!(outcome.summary(), "2 row(s) affected");

        let customer = Customer::find_by_id(1).one(&db).await.unwrap().unwrap();
        assert_eq!(customer.first_name, "Zed");
    }

    #[tokio::test]
    async fn test_failed_command_leaves_data_untouched() {
        let db = memory_db().await;
        seed_customer(&db, 1, "Ann", "Lee").await;

        assert!(run_custom(&db, "DELETE FROM no_such_table").await.is_err());
        assert_eq!(Customer::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_validate_only_queries() {
        let db = memory_db().await;
        assert!(validate(&db, "SELECT * FROM customer").await.is_ok());
        assert!(matches!(
            validate(&db, "DELETE FROM customer").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(validate(&db, "   ;").await, Err(AppError::Validation(_))));
        assert!(validate(&db, "SELECT * FROM nowhere").await.is_err());
    }

    #[test]
    fn test_history_keeps_newest() {
        let mut history = QueryHistory::with_capacity(2);
        history.record("first", 1, Ok("1 row(s)".into()));
        history.record("second", 2, Err("boom".into()));
        history.record("third", 3, Ok("0 row(s)".into()));

        let labels: Vec<_> = history.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["third", "second"]);
    }
}
