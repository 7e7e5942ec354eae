//! Record store error types

use formzone_ledger::LedgerError;
use std::path::PathBuf;

/// Errors from record access and persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row index or document key not in the store
    #[error("row not found: {0}")]
    RowNotFound(String),

    /// Field name not in the schema
    #[error("field not found: '{0}'")]
    FieldNotFound(String),

    /// Value is not one of the group's button names
    #[error("'{value}' is not a choice of '{field}' (choices: {choices:?})")]
    InvalidChoice {
        field: String,
        value: String,
        choices: Vec<String>,
    },

    /// Document key already present
    #[error("document '{0}' is already in the store")]
    DuplicateKey(String),

    /// Comments cell failed to decode
    #[error("comments of row {row} could not be read: {source}")]
    Ledger {
        row: usize,
        #[source]
        source: LedgerError,
    },

    /// CSV encoding or decoding failed
    #[error("csv error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// IO error on a batch file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create CSV error for path
    pub fn csv_error(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
