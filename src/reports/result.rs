//! Generic result grid decoded from driver rows.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::QueryResult;
use sea_orm::prelude::{DateTimeUtc, Decimal};

/// One decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Columns of a type the grid cannot decode.
    Unsupported,
}

impl Cell {
    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Decimal(v) => v.to_string().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Decode column `idx`, trying the types the admin schema produces.
    ///
    /// Integers are tried before `bool`: SQLite reports booleans as integers.
    pub(crate) fn decode(row: &QueryResult, idx: usize) -> Self {
        macro_rules! attempt {
            ($ty:ty, $wrap:expr) => {
                if let Ok(value) = row.try_get_by_index::<Option<$ty>>(idx) {
                    return value.map($wrap).unwrap_or(Cell::Null);
                }
            };
        }

        attempt!(i64, Cell::Int);
        attempt!(i32, |v| Cell::Int(v as i64));
        attempt!(i16, |v| Cell::Int(v as i64));
        attempt!(f64, Cell::Float);
        attempt!(f32, |v| Cell::Float(v as f64));
        attempt!(Decimal, Cell::Decimal);
        attempt!(String, Cell::Text);
        attempt!(bool, Cell::Bool);
        attempt!(NaiveDate, Cell::Date);
        attempt!(NaiveDateTime, Cell::DateTime);
        attempt!(DateTimeUtc, |v: DateTimeUtc| Cell::DateTime(v.naive_utc()));
        Cell::Unsupported
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:.2}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Self::Unsupported => f.write_str("<unsupported>"),
        }
    }
}

/// Columns plus typed rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    /// Decode driver rows, naming columns after the driver's column names.
    pub fn from_rows(rows: &[QueryResult]) -> Self {
        let columns = rows.first().map(|row| row.column_names()).unwrap_or_default();
        let rows = rows
            .iter()
            .map(|row| (0..columns.len()).map(|idx| Cell::decode(row, idx)).collect())
            .collect();
        Self { columns, rows }
    }

    /// Decode driver rows and label columns with display headers when they line up.
    pub fn with_headers(rows: &[QueryResult], headers: &[&str]) -> Self {
        let mut table = Self::from_rows(rows);
        if table.columns.is_empty() || table.columns.len() == headers.len() {
            table.columns = headers.iter().map(|h| h.to_string()).collect();
        }
        table
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Summary statistics over the whole table.
    pub fn analyze(&self) -> TableAnalysis {
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells = self.rows.iter().filter_map(|row| row.get(idx));
                let mut nulls = 0;
                let mut numbers = Vec::new();
                let mut all_numeric = true;
                for cell in cells {
                    if cell.is_null() {
                        nulls += 1;
                    } else if let Some(v) = cell.as_f64() {
                        numbers.push(v);
                    } else {
                        all_numeric = false;
                    }
                }

                let numeric = (all_numeric && !numbers.is_empty()).then(|| NumericSummary {
                    min: numbers.iter().copied().fold(f64::INFINITY, f64::min),
                    max: numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    avg: numbers.iter().sum::<f64>() / numbers.len() as f64,
                });

                ColumnAnalysis {
                    name: name.clone(),
                    nulls,
                    numeric,
                }
            })
            .collect();

        TableAnalysis {
            row_count: self.rows.len(),
            column_count: self.columns.len(),
            columns,
        }
    }
}

/// Output of [`ResultTable::analyze`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableAnalysis {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnAnalysis>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAnalysis {
    pub name: String,
    pub nulls: usize,
    pub numeric: Option<NumericSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl TableAnalysis {
    pub fn total_nulls(&self) -> usize {
        self.columns.iter().map(|c| c.nulls).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, DbBackend, Statement};

    use crate::db::test_support::memory_db;

    fn table() -> ResultTable {
        ResultTable {
            columns: vec!["id".into(), "name".into(), "score".into()],
            rows: vec![
                vec![Cell::Int(1), Cell::Text("a".into()), Cell::Float(2.5)],
                vec![Cell::Int(2), Cell::Null, Cell::Float(7.5)],
                vec![Cell::Int(3), Cell::Text("c".into()), Cell::Null],
            ],
        }
    }

    #[test]
    fn test_analyze_numbers() {
        let analysis = table().analyze();
        assert_eq!(analysis.row_count, 3);
        assert_eq!(analysis.column_count, 3);
        assert_eq!(analysis.total_nulls(), 2);

        let id = analysis.columns[0].numeric.unwrap();
        assert_eq!((id.min, id.max, id.avg), (1.0, 3.0, 2.0));

        assert!(analysis.columns[1].numeric.is_none());
        assert_eq!(analysis.columns[1].nulls, 1);

        let score = analysis.columns[2].numeric.unwrap();
        assert_eq!((score.min, score.max, score.avg), (2.5, 7.5, 5.0));
    }

    #[test]
    fn test_analyze_empty_table() {
        let analysis = ResultTable::default().analyze();
        assert_eq!(analysis.row_count, 0);
        assert!(analysis.columns.is_empty());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Null.to_string(), "NULL");
        assert_eq!(Cell::Float(1.0 / 3.0).to_string(), "0.33");
        assert_eq!(
            Cell::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()).to_string(),
            "2024-02-29"
        );
    }

    #[tokio::test]
    async fn test_decode_driver_rows() {
        let db = memory_db().await;
        let rows = db
            .query_all(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT 42 AS answer, 'hello' AS greeting, 1.5 AS ratio, NULL AS missing",
            ))
            .await
            .unwrap();

        let table = ResultTable::from_rows(&rows);
        assert_eq!(table.columns, vec!["answer", "greeting", "ratio", "missing"]);
        assert_eq!(
            table.rows[0],
            vec![
                Cell::Int(42),
                Cell::Text("hello".into()),
                Cell::Float(1.5),
                Cell::Null
            ]
        );
    }

    #[tokio::test]
    async fn test_headers_replace_matching_columns() {
        let db = memory_db().await;
        let rows = db
            .query_all(Statement::from_string(DbBackend::Sqlite, "SELECT 1 AS a, 2 AS b"))
            .await
            .unwrap();

        let labelled = ResultTable::with_headers(&rows, &["First", "Second"]);
        assert_eq!(labelled.columns, vec!["First", "Second"]);

        let mismatched = ResultTable::with_headers(&rows, &["Only"]);
        assert_eq!(mismatched.columns, vec!["a", "b"]);
    }
}
