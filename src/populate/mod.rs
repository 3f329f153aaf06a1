//! Mock data population across three sources (JSON files, Excel workbooks
//! and direct inserts), followed by verification.
//!
//! Each source owns a disjoint slice of every table's ids (see [`IdPlan`]),
//! so the sources can be inserted independently and in any order. A source
//! is inserted inside its own transaction; the first failure rolls that
//! source back and aborts the run.

pub mod dataset;
pub mod excel;
pub mod generator;
pub mod json;
pub mod plan;
pub mod verify;

pub use dataset::Dataset;
pub use generator::MockGenerator;
pub use plan::{IdPlan, IdRange, MAX_ROWS_PER_TABLE, Source};
pub use verify::{TableCheck, VerificationReport, dangling_references, verify};

use std::path::PathBuf;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::config::PopulateConfig;
use crate::db::schema;
use crate::error::{AppError, Result};

/// Settings for one population run.
#[derive(Debug, Clone)]
pub struct PopulateOptions {
    pub data_dir: PathBuf,
    pub rows_per_table: u32,
    pub min_rows: u64,
    /// Drop and recreate the schema first.
    pub reset: bool,
    /// Fixed seed for reproducible data.
    pub seed: Option<u64>,
    pub today: NaiveDate,
}

impl PopulateOptions {
    pub fn from_config(config: &PopulateConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            rows_per_table: config.rows_per_table,
            min_rows: config.min_rows,
            reset: false,
            seed: None,
            today: Local::now().date_naive(),
        }
    }
}

/// What one source contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: Source,
    pub rows: usize,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone)]
pub struct PopulateSummary {
    pub sources: Vec<SourceReport>,
    pub verification: VerificationReport,
}

impl PopulateSummary {
    pub fn total_rows(&self) -> usize {
        self.sources.iter().map(|s| s.rows).sum()
    }
}

/// Produce the dataset for a source, round-tripping it through its fixture files.
fn load_source(source: Source, dataset: Dataset, options: &PopulateOptions) -> Result<Dataset> {
    match source {
        Source::Json => {
            json::write_dataset(&options.data_dir, &dataset)?;
            json::read_dataset(&options.data_dir)
        }
        Source::Excel => {
            excel::write_dataset(&options.data_dir, &dataset)?;
            excel::read_dataset(&options.data_dir)
        }
        Source::Direct => Ok(dataset),
    }
}

/// Run every source in order, then verify the result.
pub async fn populate(db: &DatabaseConnection, options: &PopulateOptions) -> Result<PopulateSummary> {
    if options.rows_per_table < 3 {
        return Err(AppError::validation("Rows per table must be at least 3 (one per source)"));
    }
    if options.rows_per_table > MAX_ROWS_PER_TABLE {
        return Err(AppError::validation(format!(
            "Rows per table cannot exceed {}",
            MAX_ROWS_PER_TABLE
        )));
    }

    if options.reset {
        tracing::info!("Resetting schema before population");
        schema::reset(db).await?;
    } else {
        schema::create_all(db).await?;
    }

    let mut generator = match options.seed {
        Some(seed) => MockGenerator::seeded(seed, options.today),
        None => MockGenerator::from_os_rng(options.today),
    };

    let mut sources = Vec::new();
    for plan in IdPlan::split(options.rows_per_table) {
        let started = Instant::now();
        let source = plan.source;

        let dataset = load_source(source, generator.generate(&plan), options)?;
        let problems = dataset.integrity_problems();
        if !problems.is_empty() {
            return Err(AppError::import(source.name(), problems.join("; ")));
        }

        let txn = db.begin().await?;
        if let Err(e) = dataset.insert(&txn).await {
            tracing::error!("Source {} failed, rolling back: {}", source, e);
            txn.rollback().await?;
            return Err(AppError::import(source.name(), e.to_string()));
        }
        txn.commit().await?;

        let report = SourceReport {
            source,
            rows: dataset.total_rows(),
            elapsed_ms: started.elapsed().as_millis(),
        };
        tracing::info!("Populated {} rows from {} in {} ms", report.rows, source, report.elapsed_ms);
        sources.push(report);
    }

    let verification = verify(db, options.min_rows).await?;
    if verification.passed() {
        tracing::info!("Verification passed (threshold {})", options.min_rows);
    } else {
        tracing::warn!("Verification failed (threshold {})", options.min_rows);
    }

    Ok(PopulateSummary { sources, verification })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;
    use crate::db::get_table_counts;

    fn options(dir: &std::path::Path, rows: u32) -> PopulateOptions {
        PopulateOptions {
            data_dir: dir.to_path_buf(),
            rows_per_table: rows,
            min_rows: rows as u64,
            reset: true,
            seed: Some(17),
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let db = memory_db().await;

        let summary = populate(&db, &options(dir.path(), 400)).await.unwrap();

        assert_eq!(summary.sources.len(), 3);
        assert!(summary.verification.passed(), "{:?}", summary.verification.lines());
        assert_eq!(summary.verification.dangling_total(), 0);

        let counts = get_table_counts(&db).await.unwrap();
        assert_eq!(counts.customer, 400);
        assert!(counts.devices >= 400);
        assert!(dir.path().join("customers.json").exists());
        assert!(dir.path().join("customers.xlsx").exists());
    }

    #[tokio::test]
    async fn test_second_run_without_reset_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let db = memory_db().await;
        populate(&db, &options(dir.path(), 30)).await.unwrap();

        let mut again = options(dir.path(), 30);
        again.reset = false;
        let err = populate(&db, &again).await.unwrap_err();
        assert!(matches!(err, AppError::Import { ref source_name, .. } if source_name == "json"));

        let counts = get_table_counts(&db).await.unwrap();
        assert_eq!(counts.customer, 30);
    }

    #[tokio::test]
    async fn test_rejects_tiny_run() {
        let dir = tempfile::tempdir().unwrap();
        let db = memory_db().await;
        assert!(matches!(
            populate(&db, &options(dir.path(), 2)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_oversized_run() {
        let dir = tempfile::tempdir().unwrap();
        let db = memory_db().await;
        for rows in [MAX_ROWS_PER_TABLE + 1, u32::MAX] {
            assert!(matches!(
                populate(&db, &options(dir.path(), rows)).await,
                Err(AppError::Validation(_))
            ));
        }

        let counts = get_table_counts(&db).await.unwrap();
        assert_eq!(counts.customer, 0);
    }
}
