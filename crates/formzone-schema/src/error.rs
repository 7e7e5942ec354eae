//! Error types for schema definition and design operations

use crate::field::FieldKind;
use std::path::PathBuf;

/// Errors raised when defining or restructuring fields
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Name already taken by another column (or sibling button)
    #[error("field name '{0}' is already used")]
    DuplicateName(String),

    /// Field name or id does not exist
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Field kind string not recognised
    #[error("unknown field type: '{0}'")]
    UnknownKind(String),

    /// Name collides with a reserved record column
    #[error("'{0}' is a reserved column name")]
    ReservedName(String),

    /// Blank field name
    #[error("field name must not be empty")]
    EmptyName,

    /// Page numbers are 1-based
    #[error("invalid page number {0}; pages start at 1")]
    InvalidPage(u32),

    /// Parent/child kinds do not fit together
    #[error("invalid parent for '{child}': {reason}")]
    InvalidParent { child: String, reason: &'static str },

    /// Child and parent live on different pages
    #[error("'{field}' is on page {actual} but its group is on page {expected}")]
    PageMismatch {
        field: String,
        expected: u32,
        actual: u32,
    },

    /// Retype would break the structure around the field
    #[error("cannot retype '{field}' from {from} to {to}")]
    IncompatibleRetype {
        field: String,
        from: FieldKind,
        to: FieldKind,
    },

    /// Group conversion submitted without any child
    #[error("a radio group needs at least one child")]
    NoChildren,

    /// Candidate child lies outside the drawn group rectangle
    #[error("'{0}' is not fully inside the group rectangle")]
    NotEnclosed(String),

    /// Radio grid rejected
    #[error("radio grid rejected: {0}")]
    Grid(#[from] GridError),

    /// IO error on a page file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Page file is not valid JSON for a field list
    #[error("invalid page file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SchemaError {
    /// Create an invalid parent error
    pub fn invalid_parent(child: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidParent {
            child: child.into(),
            reason,
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reasons a radio grid cannot be turned into groups
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Grid rectangle has not been drawn
    #[error("draw a grid rectangle on the page first")]
    MissingZone,

    /// Grid rectangle below the minimum size
    #[error("grid rectangle too small; draw a larger area")]
    TooSmall,

    /// Too few row labels for the orientation
    #[error("{orientation}: add at least {required} row(s), got {actual}")]
    NotEnoughRows {
        orientation: &'static str,
        required: usize,
        actual: usize,
    },

    /// Too few column labels for the orientation
    #[error("{orientation}: add at least {required} column(s), got {actual}")]
    NotEnoughColumns {
        orientation: &'static str,
        required: usize,
        actual: usize,
    },

    /// A label is blank
    #[error("all {0} labels must be non-empty")]
    EmptyLabel(&'static str),

    /// A label repeats
    #[error("duplicate {axis} name: '{label}'")]
    DuplicateLabel { axis: &'static str, label: String },

    /// Split fractions are not strictly increasing inside (0, 1)
    #[error("{0} split fractions must be increasing values between 0 and 1")]
    BadFractions(&'static str),
}
