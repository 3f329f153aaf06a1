//! JSON fixture files, one array per table.

use std::path::{Path, PathBuf};

use super::dataset::{Dataset, Record};
use crate::error::{AppError, Result};

const SOURCE: &str = "json";

fn table_path<T: Record>(dir: &Path) -> PathBuf {
    dir.join(format!("{}.json", T::STEM))
}

/// Write one table as a pretty-printed JSON array.
pub fn write_table<T: Record>(dir: &Path, rows: &[T]) -> Result<PathBuf> {
    let path = table_path::<T>(dir);
    let content = serde_json::to_string_pretty(rows)?;
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Read one table back.
pub fn read_table<T: Record>(dir: &Path) -> Result<Vec<T>> {
    let path = table_path::<T>(dir);
    if !path.exists() {
        return Err(AppError::import(SOURCE, format!("{} not found", path.display())));
    }
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|e| AppError::import(SOURCE, format!("{}: {}", path.display(), e)))
}

/// Write all eight tables into `dir`.
pub fn write_dataset(dir: &Path, dataset: &Dataset) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    write_table(dir, &dataset.customers)?;
    write_table(dir, &dataset.devices)?;
    write_table(dir, &dataset.watch_history)?;
    write_table(dir, &dataset.favorites)?;
    write_table(dir, &dataset.payments)?;
    write_table(dir, &dataset.profiles)?;
    write_table(dir, &dataset.reviews)?;
    write_table(dir, &dataset.marks)?;
    tracing::debug!("Wrote JSON fixtures to {}", dir.display());
    Ok(())
}

/// Read all eight tables from `dir`.
pub fn read_dataset(dir: &Path) -> Result<Dataset> {
    Ok(Dataset {
        customers: read_table(dir)?,
        devices: read_table(dir)?,
        watch_history: read_table(dir)?,
        favorites: read_table(dir)?,
        payments: read_table(dir)?,
        profiles: read_table(dir)?,
        reviews: read_table(dir)?,
        marks: read_table(dir)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populate::dataset::CustomerRecord;
    use crate::populate::generator::MockGenerator;
    use crate::populate::plan::IdPlan;
    use chrono::NaiveDate;

    #[test]
    fn test_dataset_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let dataset = MockGenerator::seeded(9, today).generate(&IdPlan::split(30)[0]);

        write_dataset(dir.path(), &dataset).unwrap();
        assert_eq!(read_dataset(dir.path()).unwrap(), dataset);
    }

    #[test]
    fn test_fixture_keys() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let dataset = MockGenerator::seeded(9, today).generate(&IdPlan::split(3)[0]);
        write_dataset(dir.path(), &dataset).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("profiles.json")).unwrap();
        assert!(raw.contains("\"WatchHistoryID\""));
        assert!(raw.contains("\"profileName\""));
        assert!(raw.contains("\"customerID\""));
    }

    #[test]
    fn test_reads_fixture_without_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("customers.json"),
            r#"[{"firstName": "A", "lastName": "B", "customerID": 1,
                 "dateOfBirth": "1980-01-01", "customerSince": "2020-01-01"}]"#,
        )
        .unwrap();

        let rows: Vec<CustomerRecord> = read_table(dir.path()).unwrap();
        assert_eq!(rows[0].customer_id, 1);
        assert!(rows[0].subscription_type.is_none());
    }

    #[test]
    fn test_missing_file_is_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_dataset(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Import { .. }));
    }
}
