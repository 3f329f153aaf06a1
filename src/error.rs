//! Error types and handling.

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON fixture or profile store error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing an Excel workbook failed
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Reading an Excel workbook failed
    #[error("Excel read error: {0}")]
    ExcelRead(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Population run aborted
    #[error("Import from {source_name} failed: {message}")]
    Import { source_name: String, message: String },
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error with message
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an import error for a population source
    pub fn import(source_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Import {
            source_name: source_name.into(),
            message: msg.into(),
        }
    }
}

impl From<calamine::XlsxError> for AppError {
    fn from(e: calamine::XlsxError) -> Self {
        Self::ExcelRead(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_message() {
        let err = AppError::import("excel", "missing column customerID");
        assert_eq!(err.to_string(), "Import from excel failed: missing column customerID");
    }

    #[test]
    fn test_db_error_converts() {
        let err: AppError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, AppError::Database(_)));
    }
}
