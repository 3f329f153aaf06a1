//! SQL script file dialogs.

use std::path::{Path, PathBuf};

use chrono::Local;

/// Open a SQL script with a file dialog.
pub fn show_open_sql_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("SQL Files", &["sql"])
        .add_filter("All Files", &["*"])
        .pick_file()
}

/// Choose where to save a SQL script.
pub fn show_save_sql_dialog(current: Option<&Path>) -> Option<PathBuf> {
    let name = current
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| default_filename("query", "sql"));
    rfd::FileDialog::new()
        .set_file_name(name)
        .add_filter("SQL Files", &["sql"])
        .save_file()
}

/// Timestamped default filename, e.g. `query_20240301_142530.sql`.
pub fn default_filename(prefix: &str, extension: &str) -> String {
    let prefix: String = prefix
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{prefix}_{ts}.{extension}", ts = Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filename() {
        let name = default_filename("Top Customers", "sql");
        assert!(name.starts_with("top_customers_"));
        assert!(name.ends_with(".sql"));
        assert_eq!(name.len(), "top_customers_".len() + 15 + ".sql".len());
    }
}
