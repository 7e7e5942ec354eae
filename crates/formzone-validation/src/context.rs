//! Inputs and outputs of a single strategy invocation

use crate::error::ConfigError;
use crate::lookup::LookupTable;
use crate::rule::ValidationRule;
use formzone_ledger::Comment;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

/// Read access to one record's captured values
pub trait ValueSource {
    /// Value of a field, if the record has the column
    fn value(&self, field: &str) -> Option<&str>;
}

impl<S: BuildHasher> ValueSource for HashMap<String, String, S> {
    fn value(&self, field: &str) -> Option<&str> {
        self.get(field).map(String::as_str)
    }
}

impl<S: BuildHasher> ValueSource for IndexMap<String, String, S> {
    fn value(&self, field: &str) -> Option<&str> {
        self.get(field).map(String::as_str)
    }
}

/// `(page, field, message)` emitted by a strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Finding {
    /// Page of the field
    pub page: u32,
    /// Field the finding is attributed to
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl Finding {
    /// Create finding
    pub fn new(page: u32, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            page,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<Finding> for Comment {
    fn from(finding: Finding) -> Self {
        Comment::new(finding.page, finding.field, finding.message)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}: {}: {}", self.page, self.field, self.message)
    }
}

/// Everything a strategy may look at for one rule and one record
pub struct ValidationContext<'a> {
    /// Captured values of the record
    pub values: &'a dyn ValueSource,
    /// Rule being applied
    pub rule: &'a ValidationRule,
    /// Column → page map, built once per batch
    pub field_to_page: &'a HashMap<String, u32>,
    /// Project lookup list, if configured
    pub lookup: Option<&'a LookupTable>,
}

impl ValidationContext<'_> {
    /// Fields named by the rule
    #[inline]
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.rule.field_names
    }

    /// Value of a field; empty when absent
    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        self.values.value(field).unwrap_or_default()
    }

    /// Page of a field; 1 when unmapped
    #[must_use]
    pub fn page(&self, field: &str) -> u32 {
        self.field_to_page.get(field).copied().unwrap_or(1)
    }

    /// Finding on a field at its page
    #[must_use]
    pub fn finding(&self, field: &str, message: impl Into<String>) -> Finding {
        Finding::new(self.page(field), field, message)
    }

    /// Lookup list, required by lookup strategies
    ///
    /// # Errors
    ///
    /// [`ConfigError::LookupUnavailable`] when the project has none.
    pub fn require_lookup(&self) -> Result<&LookupTable, ConfigError> {
        self.lookup
            .ok_or_else(|| ConfigError::LookupUnavailable(self.rule.strategy.clone()))
    }
}
