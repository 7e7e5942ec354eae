//! Configuration error types

use std::path::PathBuf;

/// A rule or lookup list that cannot be used
///
/// Raised per rule; a validation run skips the rule and reports it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Strategy name not in the registry
    #[error("unknown validation strategy '{0}'")]
    UnknownStrategy(String),

    /// Rule names a field the schema does not have
    #[error("rule references unknown field '{0}'")]
    UnknownField(String),

    /// Rule has the wrong number of fields
    #[error("strategy '{strategy}' needs {expected} field(s), got {actual}")]
    FieldCount {
        strategy: String,
        expected: &'static str,
        actual: usize,
    },

    /// Required parameter absent
    #[error("missing parameter '{0}'")]
    MissingParameter(String),

    /// Parameter present with the wrong shape
    #[error("parameter '{name}' must be {expected}")]
    MalformedParameter { name: String, expected: &'static str },

    /// Strategy needs a lookup list but none is configured
    #[error("strategy '{0}' needs a lookup list")]
    LookupUnavailable(String),

    /// Lookup list could not be read
    #[error("lookup list {path}: {reason}")]
    Lookup { path: PathBuf, reason: String },
}

impl ConfigError {
    /// Create malformed-parameter error
    pub fn malformed(name: impl Into<String>, expected: &'static str) -> Self {
        Self::MalformedParameter {
            name: name.into(),
            expected,
        }
    }
}
