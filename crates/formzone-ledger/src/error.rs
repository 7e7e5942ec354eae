//! Ledger error types

/// Errors from ledger edits and decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Encoded ledger could not be decoded
    #[error("malformed comment #{entry} '{text}': {reason}")]
    Serialization {
        entry: usize,
        text: String,
        reason: &'static str,
    },

    /// Comment not present in the ledger
    #[error("comment not found: {0}")]
    NotFound(String),

    /// Edit would duplicate another comment
    #[error("comment already exists: {0}")]
    Duplicate(String),
}

impl LedgerError {
    /// Create decoding error for one entry
    pub fn serialization(entry: usize, text: impl Into<String>, reason: &'static str) -> Self {
        Self::Serialization {
            entry,
            text: text.into(),
            reason,
        }
    }
}
