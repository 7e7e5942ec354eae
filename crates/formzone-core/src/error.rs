//! Error types for Formzone Core
//!
//! [`FormzoneError`] wraps every component error so callers can report any
//! failure with one type, and classifies it with [`ErrorKind`].

use crate::escalation::EscalationError;
use formzone_ledger::LedgerError;
use formzone_records::StoreError;
use formzone_schema::{FieldKind, SchemaError};
use formzone_validation::ConfigError;
use std::path::PathBuf;

/// Main Formzone error type
#[derive(Debug, thiserror::Error)]
pub enum FormzoneError {
    /// Schema definition or design edit failed
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Comment ledger operation failed
    #[error("comment error: {0}")]
    Ledger(#[from] LedgerError),

    /// Record access or batch persistence failed
    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// Validation rule or lookup list unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Escalation workflow refused the operation
    #[error("escalation error: {0}")]
    Escalation(#[from] EscalationError),

    /// Project configuration file unreadable
    #[error("project config {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    /// IO error on a project file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation applied to a field of the wrong kind
    #[error("cannot {operation} '{field}' ({kind}); expected {expected}")]
    WrongKind {
        field: String,
        kind: FieldKind,
        operation: &'static str,
        expected: &'static str,
    },

    /// Batch validation worker stopped abnormally
    #[error("validation worker failed: {0}")]
    Worker(String),
}

/// Coarse classification of a [`FormzoneError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid schema definition or edit
    Schema,
    /// Unknown row, field or comment
    NotFound,
    /// Value or request the model rejects
    Input,
    /// Bad project configuration
    Configuration,
    /// Escalation workflow conflict
    Escalation,
    /// Stored text that cannot be decoded
    Serialization,
    /// File system failure
    Persistence,
    /// Failure inside the core itself
    Internal,
}

impl FormzoneError {
    /// Create IO error for path
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create config-file error
    #[inline]
    pub fn config_file(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ConfigFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema(SchemaError::Io { .. } | SchemaError::Json { .. }) => ErrorKind::Persistence,
            Self::Schema(_) => ErrorKind::Schema,
            Self::Ledger(LedgerError::Serialization { .. })
            | Self::Store(StoreError::Ledger { .. }) => ErrorKind::Serialization,
            Self::Ledger(LedgerError::NotFound(_))
            | Self::Store(StoreError::RowNotFound(_) | StoreError::FieldNotFound(_)) => ErrorKind::NotFound,
            Self::Ledger(LedgerError::Duplicate(_))
            | Self::Store(StoreError::InvalidChoice { .. } | StoreError::DuplicateKey(_))
            | Self::WrongKind { .. } => ErrorKind::Input,
            Self::Store(StoreError::Csv { .. } | StoreError::Io { .. }) | Self::Io { .. } => {
                ErrorKind::Persistence
            }
            Self::Config(_) | Self::ConfigFile { .. } => ErrorKind::Configuration,
            Self::Escalation(_) => ErrorKind::Escalation,
            Self::Worker(_) => ErrorKind::Internal,
        }
    }

    /// Check if the user can fix this by changing what they asked for
    ///
    /// Persistence, decoding and internal failures need attention outside the
    /// current operation.
    #[inline]
    #[must_use]
    pub fn is_user_recoverable(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::Persistence | ErrorKind::Serialization | ErrorKind::Internal
        )
    }
}

/// Result alias for core operations
pub type Result<T, E = FormzoneError> = std::result::Result<T, E>;
