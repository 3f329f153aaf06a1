//! Excel fixture workbooks, one per table.
//!
//! Each workbook has a single sheet named after the table: a header row of
//! fixture keys followed by one row per record.

use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use serde_json::{Map, Value};

use super::dataset::{Dataset, Record};
use crate::error::{AppError, Result};

const SOURCE: &str = "excel";

fn table_path<T: Record>(dir: &Path) -> PathBuf {
    dir.join(format!("{}.xlsx", T::STEM))
}

fn to_object<T: Record>(row: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(row)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::import(SOURCE, format!("{} row is not a record: {}", T::STEM, other))),
    }
}

/// Write one table to `<stem>.xlsx`.
pub fn write_table<T: Record>(dir: &Path, rows: &[T]) -> Result<PathBuf> {
    let path = table_path::<T>(dir);
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(T::STEM)?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin);

    let objects = rows.iter().map(to_object).collect::<Result<Vec<_>>>()?;
    let headers: Vec<String> = objects.first().map(|o| o.keys().cloned().collect()).unwrap_or_default();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
        worksheet.set_column_width(col as u16, 18)?;
    }

    for (idx, object) in objects.iter().enumerate() {
        let row = (idx + 1) as u32;
        for (col, header) in headers.iter().enumerate() {
            let col = col as u16;
            match object.get(header) {
                Some(Value::Number(n)) => {
                    worksheet.write_number(row, col, n.as_f64().unwrap_or_default())?;
                }
                Some(Value::String(s)) => {
                    worksheet.write_string(row, col, s)?;
                }
                Some(Value::Bool(b)) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Some(Value::Null) | None => {}
                Some(other) => {
                    worksheet.write_string(row, col, other.to_string())?;
                }
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    workbook.save(&path)?;
    Ok(path)
}

/// Convert a cell to the JSON value serde expects. Whole floats become integers.
fn cell_value(cell: &Data) -> Result<Option<Value>> {
    let value = match cell {
        Data::Empty => return Ok(None),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(*f as i64),
        Data::Float(f) => Value::from(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Value::from(s.clone()),
        Data::Bool(b) => Value::from(*b),
        Data::DateTime(dt) => Value::from(dt.as_f64()),
        Data::Error(e) => return Err(AppError::import(SOURCE, format!("cell error {:?}", e))),
    };
    Ok(Some(value))
}

/// Read one table from `<stem>.xlsx`.
pub fn read_table<T: Record>(dir: &Path) -> Result<Vec<T>> {
    let path = table_path::<T>(dir);
    if !path.exists() {
        return Err(AppError::import(SOURCE, format!("{} not found", path.display())));
    }

    let mut workbook: Xlsx<_> = open_workbook(&path)?;
    let range = workbook.worksheet_range(T::STEM)?;
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();

    rows.enumerate()
        .map(|(idx, row)| {
            let mut object = Map::new();
            for (header, cell) in headers.iter().zip(row) {
                if let Some(value) = cell_value(cell)? {
                    object.insert(header.clone(), value);
                }
            }
            serde_json::from_value(Value::Object(object)).map_err(|e| {
                AppError::import(SOURCE, format!("{} row {}: {}", path.display(), idx + 2, e))
            })
        })
        .collect()
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
    tracing::debug!("Wrote Excel fixtures to {}", dir.display());
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
    use crate::populate::dataset::MarkRecord;
    use crate::populate::generator::MockGenerator;
    use crate::populate::plan::IdPlan;
    use chrono::NaiveDate;

    #[test]
    fn test_dataset_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let dataset = MockGenerator::seeded(21, today).generate(&IdPlan::split(30)[1]);

        write_dataset(dir.path(), &dataset).unwrap();
        assert_eq!(read_dataset(dir.path()).unwrap(), dataset);
    }

    #[test]
    fn test_empty_table_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        write_table::<MarkRecord>(dir.path(), &[]).unwrap();
        let rows: Vec<MarkRecord> = read_table(dir.path()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_cell_value_conversion() {
        assert_eq!(cell_value(&Data::Float(7.0)).unwrap(), Some(Value::from(7)));
        assert_eq!(cell_value(&Data::Float(7.5)).unwrap(), Some(Value::from(7.5)));
        assert_eq!(cell_value(&Data::Empty).unwrap(), None);
        assert!(cell_value(&Data::Error(calamine::CellErrorType::Div0)).is_err());
    }

    #[test]
    fn test_missing_workbook_is_import_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_dataset(dir.path()), Err(AppError::Import { .. })));
    }
}
