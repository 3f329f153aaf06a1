//! Queries & reports: canned queries, date-ranged reports and custom SQL.

pub mod catalog;
pub mod custom;
pub mod result;

pub use catalog::{PREDEFINED_QUERIES, PredefinedQuery, QueryArg, QueryArgs, ReportKind};
pub use custom::{CustomOutcome, HistoryEntry, QueryHistory, StatementKind, classify, run_custom, run_statement, validate};
pub use result::{Cell, ColumnAnalysis, NumericSummary, ResultTable, TableAnalysis};

use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, DbErr};

/// Run a predefined query, labelling columns with its headers.
pub async fn run_predefined(
    db: &DatabaseConnection,
    query: &PredefinedQuery,
    args: &QueryArgs,
) -> Result<(ResultTable, u128), DbErr> {
    tracing::debug!("Running predefined query {}", query.id);
    run_statement(db, query.statement(args), query.columns).await
}

/// Run a report over an inclusive date range.
pub async fn run_report(
    db: &DatabaseConnection,
    kind: ReportKind,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<(ResultTable, u128), DbErr> {
    if from > to {
        return Err(DbErr::Custom("Report start date is after the end date".to_string()));
    }
    tracing::debug!("Running {} report for {} to {}", kind, from, to);
    run_statement(db, kind.statement(from, to), kind.columns()).await
}
