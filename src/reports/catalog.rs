//! Predefined queries and date-ranged reports.
//!
//! Every statement targets PostgreSQL and binds its inputs as `$n`
//! placeholders; nothing typed by the user is spliced into SQL text.

use chrono::{Datelike, Months, NaiveDate};
use sea_orm::{DbBackend, Statement, Value};

/// A value a predefined query binds, resolved from [`QueryArgs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryArg {
    /// First day of the selected year.
    YearStart,
    /// First day of the year after the selected one.
    NextYearStart,
    /// First day of the selected month.
    MonthStart,
    /// First day of the month after the selected one.
    NextMonthStart,
    /// Payment total threshold.
    Threshold,
    /// Twelve months before today.
    YearAgo,
}

/// User-adjustable inputs for predefined queries.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryArgs {
    pub year: i32,
    pub month: u32,
    pub threshold: f64,
    pub today: NaiveDate,
}

impl QueryArgs {
    /// Defaults relative to `today`: current year, October, threshold 200.
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            year: today.year(),
            month: 10,
            threshold: 200.0,
            today,
        }
    }

    fn resolve(&self, arg: QueryArg) -> Value {
        let year_start = NaiveDate::from_ymd_opt(self.year, 1, 1).unwrap_or(self.today);
        let month_start = NaiveDate::from_ymd_opt(self.year, self.month.clamp(1, 12), 1).unwrap_or(self.today);
        match arg {
            QueryArg::YearStart => year_start.into(),
            QueryArg::NextYearStart => (year_start + Months::new(12)).into(),
            QueryArg::MonthStart => month_start.into(),
            QueryArg::NextMonthStart => (month_start + Months::new(1)).into(),
            QueryArg::Threshold => self.threshold.into(),
            QueryArg::YearAgo => (self.today - Months::new(12)).into(),
        }
    }
}

/// A canned query shown on the predefined tab.
#[derive(Debug, Clone, Copy)]
pub struct PredefinedQuery {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub sql: &'static str,
    pub columns: &'static [&'static str],
    /// Values bound to `$1..$n`, in order.
    pub binds: &'static [QueryArg],
}

impl PredefinedQuery {
    /// Build the statement with `args` bound.
    pub fn statement(&self, args: &QueryArgs) -> Statement {
        let values: Vec<Value> = self.binds.iter().map(|arg| args.resolve(*arg)).collect();
        Statement::from_sql_and_values(DbBackend::Postgres, self.sql, values)
    }

    /// Look up a query by id.
    pub fn find(id: &str) -> Option<&'static PredefinedQuery> {
        PREDEFINED_QUERIES.iter().find(|q| q.id == id)
    }
}

pub static PREDEFINED_QUERIES: &[PredefinedQuery] = &[
    PredefinedQuery {
        id: "viewing_history_year",
        name: "Viewing history for a year",
        description: "Every viewing session in the selected year with the viewer's name",
        sql: r#"
        SELECT c.firstname, c.lastname, p.profilename, wh.movieid, wh.watchdate, wh.durationwatched
        FROM watchhistory wh
        JOIN profile p ON p.watchhistoryid = wh.watchhistoryid
        JOIN customer c ON c.customerid = p.customerid
        WHERE wh.watchdate >= $1 AND wh.watchdate < $2
        ORDER BY wh.watchdate DESC
        "#,
        columns: &["First Name", "Last Name", "Profile", "Movie ID", "Watch Date", "Duration"],
        binds: &[QueryArg::YearStart, QueryArg::NextYearStart],
    },
    PredefinedQuery {
        id: "favorites_avg_time",
        name: "Favorites average watch time",
        description: "Average total watch time of each favorited movie and how many profiles marked it",
        sql: r#"
        SELECT f.movieid, AVG(f.totaltimewatched) AS avg_time, COUNT(m.profileid) AS marked_by
        FROM favorites f
        JOIN marksasfavorite m ON m.movieid = f.movieid
        GROUP BY f.movieid
        ORDER BY avg_time DESC
        "#,
        columns: &["Movie ID", "Average Time", "Marked By"],
        binds: &[],
    },
    PredefinedQuery {
        id: "high_paying_customers",
        name: "High-paying customers",
        description: "Customers whose payments over the last twelve months exceed the threshold",
        sql: r#"
        SELECT c.customerid, c.firstname, c.lastname, SUM(pa.amount) AS total_paid, COUNT(pa.paymentid) AS payments
        FROM customer c
        JOIN payment pa ON pa.customerid = c.customerid
        WHERE pa.paymentdate >= $1
        GROUP BY c.customerid, c.firstname, c.lastname
        HAVING SUM(pa.amount) > $2
        ORDER BY total_paid DESC
        "#,
        columns: &["Customer ID", "First Name", "Last Name", "Total Paid", "Payments"],
        binds: &[QueryArg::YearAgo, QueryArg::Threshold],
    },
    PredefinedQuery {
        id: "multi_device_customers",
        name: "Customers with more than two devices",
        description: "Customers with more than two registered devices and the device types they use",
        sql: r#"
        SELECT c.customerid, c.firstname, c.lastname, COUNT(d.deviceid) AS devices,
               STRING_AGG(DISTINCT d.devicetype, ', ') AS device_types
        FROM customer c
        JOIN devices d ON d.customerid = c.customerid
        GROUP BY c.customerid, c.firstname, c.lastname
        HAVING COUNT(d.deviceid) > 2
        ORDER BY devices DESC
        "#,
        columns: &["Customer ID", "First Name", "Last Name", "Devices", "Device Types"],
        binds: &[],
    },
    PredefinedQuery {
        id: "low_rated_favorites",
        name: "Low-rated favorites",
        description: "Favorited movies that received a review rating below 3",
        sql: r#"
        SELECT DISTINCT f.movieid, r.rating, r.comment, p.profilename
        FROM favorites f
        JOIN marksasfavorite m ON m.movieid = f.movieid
        JOIN reviews r ON r.movieid = f.movieid
        JOIN profile p ON p.profileid = r.profileid
        WHERE r.rating < 3
        ORDER BY r.rating, f.movieid
        "#,
        columns: &["Movie ID", "Rating", "Comment", "Reviewer"],
        binds: &[],
    },
    PredefinedQuery {
        id: "watched_in_month",
        name: "Watched in a month",
        description: "Viewing sessions in the selected month of the selected year",
        sql: r#"
        SELECT c.firstname, c.lastname, wh.movieid, wh.watchdate, wh.durationwatched
        FROM watchhistory wh
        JOIN profile p ON p.watchhistoryid = wh.watchhistoryid
        JOIN customer c ON c.customerid = p.customerid
        WHERE wh.watchdate >= $1 AND wh.watchdate < $2
        ORDER BY wh.watchdate
        "#,
        columns: &["First Name", "Last Name", "Movie ID", "Watch Date", "Duration"],
        binds: &[QueryArg::MonthStart, QueryArg::NextMonthStart],
    },
    PredefinedQuery {
        id: "no_payments_this_year",
        name: "No payments this year",
        description: "Customers without any payment since the start of the selected year",
        sql: r#"
        SELECT c.customerid, c.firstname, c.lastname, c.subscription_type, c.payment_status
        FROM customer c
        WHERE c.customerid NOT IN (
            SELECT pa.customerid FROM payment pa WHERE pa.paymentdate >= $1
        )
        ORDER BY c.customerid
        "#,
        columns: &["Customer ID", "First Name", "Last Name", "Subscription", "Payment Status"],
        binds: &[QueryArg::YearStart],
    },
    PredefinedQuery {
        id: "monthly_viewing_trends",
        name: "Monthly viewing trends",
        description: "Sessions, viewers and hours watched per month over the last twelve months",
        sql: r#"
        SELECT TO_CHAR(wh.watchdate, 'YYYY-MM') AS month,
               COUNT(*) AS sessions,
               COUNT(DISTINCT p.profileid) AS viewers,
               ROUND((SUM(wh.durationwatched) / 60.0)::numeric, 1) AS hours
        FROM watchhistory wh
        LEFT JOIN profile p ON p.watchhistoryid = wh.watchhistoryid
        WHERE wh.watchdate >= $1
        GROUP BY month
        ORDER BY month
        "#,
        columns: &["Month", "Sessions", "Viewers", "Hours"],
        binds: &[QueryArg::YearAgo],
    },
];

/// Date-ranged reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportKind {
    #[default]
    CustomerSummary,
    ContentPerformance,
    ViewingAnalytics,
    Revenue,
    UserEngagement,
    SystemHealth,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        Self::CustomerSummary,
        Self::ContentPerformance,
        Self::ViewingAnalytics,
        Self::Revenue,
        Self::UserEngagement,
        Self::SystemHealth,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CustomerSummary => "Customer Summary",
            Self::ContentPerformance => "Content Performance",
            Self::ViewingAnalytics => "Viewing Analytics",
            Self::Revenue => "Revenue",
            Self::UserEngagement => "User Engagement",
            Self::SystemHealth => "System Health",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::CustomerSummary => &[
                "Customer ID",
                "Name",
                "Subscription",
                "Profiles",
                "Sessions",
                "Hours Watched",
                "Total Paid",
            ],
            Self::ContentPerformance => &["Movie ID", "Title", "Views", "Viewers", "Avg Completion", "Hours"],
            Self::ViewingAnalytics => &["Date", "Sessions", "Viewers", "Hours", "Avg Completion"],
            Self::Revenue => &["Month", "Method", "Payments", "Revenue", "Average Payment"],
            Self::UserEngagement => &["Profile ID", "Profile", "Customer", "Status", "Sessions", "Reviews", "Favorites"],
            Self::SystemHealth => &["Metric", "Value"],
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::CustomerSummary => {
                r#"
        SELECT c.customerid,
               c.firstname || ' ' || c.lastname AS name,
               COALESCE(c.subscription_type, 'Unknown') AS subscription,
               COUNT(DISTINCT p.profileid) AS profiles,
               COUNT(DISTINCT wh.watchhistoryid) AS sessions,
               ROUND((COALESCE(SUM(wh.durationwatched), 0) / 60.0)::numeric, 1) AS hours,
               COALESCE((
                   SELECT SUM(pa.amount) FROM payment pa
                   WHERE pa.customerid = c.customerid AND pa.paymentdate BETWEEN $1 AND $2
               ), 0) AS total_paid
        FROM customer c
        LEFT JOIN profile p ON p.customerid = c.customerid
        LEFT JOIN watchhistory wh ON wh.watchhistoryid = p.watchhistoryid
            AND wh.watchdate BETWEEN $1 AND $2
        GROUP BY c.customerid, c.firstname, c.lastname, c.subscription_type
        ORDER BY total_paid DESC, c.customerid
        "#
            }
            Self::ContentPerformance => {
                r#"
        SELECT wh.movieid,
               COALESCE(t.title_name, 'Movie ' || wh.movieid) AS title,
               COUNT(*) AS views,
               COUNT(DISTINCT p.profileid) AS viewers,
               ROUND(AVG(wh.completion_percentage)::numeric, 1) AS avg_completion,
               ROUND((SUM(wh.durationwatched) / 60.0)::numeric, 1) AS hours
        FROM watchhistory wh
        LEFT JOIN title t ON t.title_id = wh.movieid
        LEFT JOIN profile p ON p.watchhistoryid = wh.watchhistoryid
        WHERE wh.watchdate BETWEEN $1 AND $2
        GROUP BY wh.movieid, t.title_name
        ORDER BY views DESC, hours DESC
        "#
            }
            Self::ViewingAnalytics => {
                r#"
        SELECT wh.watchdate,
               COUNT(*) AS sessions,
               COUNT(DISTINCT p.profileid) AS viewers,
               ROUND((SUM(wh.durationwatched) / 60.0)::numeric, 1) AS hours,
               ROUND(AVG(wh.completion_percentage)::numeric, 1) AS avg_completion
        FROM watchhistory wh
        LEFT JOIN profile p ON p.watchhistoryid = wh.watchhistoryid
        WHERE wh.watchdate BETWEEN $1 AND $2
        GROUP BY wh.watchdate
        ORDER BY wh.watchdate
        "#
            }
            Self::Revenue => {
                r#"
        SELECT TO_CHAR(pa.paymentdate, 'YYYY-MM') AS month,
               pa.paymentmethod,
               COUNT(*) AS payments,
               ROUND(SUM(pa.amount)::numeric, 2) AS revenue,
               ROUND(AVG(pa.amount)::numeric, 2) AS average_payment
        FROM payment pa
        WHERE pa.paymentdate BETWEEN $1 AND $2
        GROUP BY month, pa.paymentmethod
        ORDER BY month, revenue DESC
        "#
            }
            Self::UserEngagement => {
                r#"
        SELECT p.profileid,
               p.profilename,
               c.firstname || ' ' || c.lastname AS customer,
               COALESCE(p.account_status, 'Unknown') AS status,
               COUNT(DISTINCT wh.watchhistoryid) AS sessions,
               (SELECT COUNT(*) FROM reviews r
                WHERE r.profileid = p.profileid AND r.reviewdate BETWEEN $1 AND $2) AS reviews,
               (SELECT COUNT(*) FROM marksasfavorite m WHERE m.profileid = p.profileid) AS favorites
        FROM profile p
        JOIN customer c ON c.customerid = p.customerid
        LEFT JOIN watchhistory wh ON wh.watchhistoryid = p.watchhistoryid
            AND wh.watchdate BETWEEN $1 AND $2
        GROUP BY p.profileid, p.profilename, c.firstname, c.lastname, p.account_status
        ORDER BY sessions DESC, reviews DESC, p.profileid
        "#
            }
            Self::SystemHealth => {
                r#"
        SELECT 'Customers' AS metric, COUNT(*)::text AS value FROM customer
        UNION ALL
        SELECT 'Profiles online', COUNT(*)::text FROM profile WHERE isonline
        UNION ALL
        SELECT 'Devices seen in range', COUNT(*)::text FROM devices WHERE lastseen BETWEEN $1 AND $2
        UNION ALL
        SELECT 'Sessions in range', COUNT(*)::text FROM watchhistory WHERE watchdate BETWEEN $1 AND $2
        UNION ALL
        SELECT 'Payments in range', COUNT(*)::text FROM payment WHERE paymentdate BETWEEN $1 AND $2
        UNION ALL
        SELECT 'Reviews in range', COUNT(*)::text FROM reviews WHERE reviewdate BETWEEN $1 AND $2
        UNION ALL
        SELECT 'Failed payments', COUNT(*)::text FROM payment WHERE status = 'Failed'
        "#
            }
        }
    }

    /// Build the report statement for an inclusive date range.
    pub fn statement(&self, from: NaiveDate, to: NaiveDate) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, self.sql(), [from.into(), to.into()])
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Highest `$n` placeholder referenced by `sql`.
pub fn max_placeholder(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut max = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let digits: String = sql[i + 1..].chars().take_while(char::is_ascii_digit).collect();
            if let Ok(n) = digits.parse::<usize>() {
                max = max.max(n);
            }
            i += digits.len();
        }
        i += 1;
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use sea_orm::{ConnectionTrait, DatabaseConnection};

    use crate::db::test_support::memory_db;
    use crate::populate::{PopulateOptions, populate};
    use crate::reports::ResultTable;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bound(stmt: &Statement) -> usize {
        stmt.values.as_ref().map(|v| v.0.len()).unwrap_or(0)
    }

    #[test]
    fn test_catalog_ids_unique() {
        let ids: HashSet<_> = PREDEFINED_QUERIES.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), PREDEFINED_QUERIES.len());
        assert_eq!(PREDEFINED_QUERIES.len(), 8);
    }

    #[test]
    fn test_predefined_bind_counts_match_placeholders() {
        let args = QueryArgs::for_today(date(2024, 6, 15));
        for query in PREDEFINED_QUERIES {
            let stmt = query.statement(&args);
            assert_eq!(bound(&stmt), max_placeholder(query.sql), "query {}", query.id);
        }
    }

    #[test]
    fn test_report_bind_counts() {
        for kind in ReportKind::ALL {
            let stmt = kind.statement(date(2024, 1, 1), date(2024, 12, 31));
            assert_eq!(bound(&stmt), 2, "report {}", kind);
            assert_eq!(max_placeholder(&stmt.sql), 2, "report {}", kind);
        }
    }

    #[test]
    fn test_query_args_resolve_month_range() {
        let mut args = QueryArgs::for_today(date(2024, 6, 15));
        args.month = 12;
        assert_eq!(args.resolve(QueryArg::MonthStart), Value::from(date(2024, 12, 1)));
        assert_eq!(args.resolve(QueryArg::NextMonthStart), Value::from(date(2025, 1, 1)));
        assert_eq!(args.resolve(QueryArg::YearAgo), Value::from(date(2023, 6, 15)));
    }

    #[test]
    fn test_max_placeholder() {
        assert_eq!(max_placeholder("SELECT 1"), 0);
        assert_eq!(max_placeholder("WHERE a = $1 AND b = $12 OR c = $3"), 12);
        assert_eq!(max_placeholder("SELECT '$' || x"), 0);
    }

    #[test]
    fn test_find() {
        assert!(PredefinedQuery::find("low_rated_favorites").is_some());
        assert!(PredefinedQuery::find("nope").is_none());
    }

    /// Rewrite the PostgreSQL-only bits so a statement runs on SQLite.
    fn sqlite_dialect(sql: &str) -> String {
        sql.replace('$', "?")
            .replace("::numeric", "")
            .replace("::text", "")
            .replace("TO_CHAR(", "strftime('%Y-%m', ")
            .replace(", 'YYYY-MM')", ")")
            .replace("STRING_AGG(DISTINCT d.devicetype, ', ')", "GROUP_CONCAT(DISTINCT d.devicetype)")
    }

    async fn populated(dir: &std::path::Path) -> DatabaseConnection {
        let db = memory_db().await;
        let options = PopulateOptions {
            data_dir: dir.to_path_buf(),
            rows_per_table: 90,
            min_rows: 90,
            reset: true,
            seed: Some(5),
            today: date(2024, 6, 1),
        };
        populate(&db, &options).await.unwrap();
        db
    }

    async fn run_on_sqlite(db: &DatabaseConnection, stmt: Statement) -> ResultTable {
        let values = stmt.values.map(|v| v.0).unwrap_or_default();
        let sqlite = Statement::from_sql_and_values(DbBackend::Sqlite, sqlite_dialect(&stmt.sql), values);
        let rows = db.query_all(sqlite).await.unwrap();
        ResultTable::from_rows(&rows)
    }

    #[tokio::test]
    async fn test_predefined_queries_return_their_columns() {
        let dir = tempfile::tempdir().unwrap();
        let db = populated(dir.path()).await;

        let mut args = QueryArgs::for_today(date(2024, 6, 1));
        args.month = 3;
        args.threshold = 0.0;

        for query in PREDEFINED_QUERIES {
            let table = run_on_sqlite(&db, query.statement(&args)).await;
            assert!(!table.is_empty(), "query {} returned no rows", query.id);
            assert_eq!(table.columns.len(), query.columns.len(), "query {}", query.id);
        }
    }

    #[tokio::test]
    async fn test_reports_return_their_columns() {
        let dir = tempfile::tempdir().unwrap();
        let db = populated(dir.path()).await;

        for kind in ReportKind::ALL {
            let table = run_on_sqlite(&db, kind.statement(date(2023, 6, 1), date(2024, 6, 1))).await;
            assert!(!table.is_empty(), "report {} returned no rows", kind);
            assert_eq!(table.columns.len(), kind.columns().len(), "report {}", kind);
        }
    }
}
