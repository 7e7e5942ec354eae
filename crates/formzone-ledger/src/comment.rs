//! A single annotation on a document record

use serde::{Deserialize, Serialize};
use std::fmt;

/// `(page, field, message)` annotation
///
/// Identity is the triple; `escalated` is a property layered on top by QC.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comment {
    /// 1-based page the field lives on
    pub page: u32,
    /// Field (column) name
    pub field: String,
    /// Free-text message
    pub message: String,
    /// Marked for escalation by QC
    #[serde(default)]
    pub escalated: bool,
}

impl Comment {
    /// Create plain comment
    #[must_use]
    pub fn new(page: u32, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            page,
            field: field.into(),
            message: message.into(),
            escalated: false,
        }
    }

    /// Mark escalated
    #[inline]
    #[must_use]
    pub fn into_escalated(mut self) -> Self {
        self.escalated = true;
        self
    }

    /// Same `(page, field, message)` triple, ignoring the escalation flag
    #[inline]
    #[must_use]
    pub fn same_triple(&self, other: &Comment) -> bool {
        self.page == other.page && self.field == other.field && self.message == other.message
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}: {}: {}", self.page, self.field, self.message)
    }
}
