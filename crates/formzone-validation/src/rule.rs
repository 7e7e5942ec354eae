//! Validation rules as configured per project

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{strategy, field_names, params}` entry of a project configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Registry key of the strategy
    pub strategy: String,
    /// Fields the strategy inspects, in order
    #[serde(default)]
    pub field_names: Vec<String>,
    /// Strategy-specific parameters
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ValidationRule {
    /// Create rule without parameters
    pub fn new<I, S>(strategy: impl Into<String>, field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strategy: strategy.into(),
            field_names: field_names.into_iter().map(Into::into).collect(),
            params: Map::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Non-negative integer parameter, or `default` when absent
    ///
    /// # Errors
    ///
    /// [`ConfigError::MalformedParameter`] when present but not an integer.
    pub fn param_u64(&self, name: &str, default: u64) -> Result<u64, ConfigError> {
        match self.params.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value
                .as_u64()
                .ok_or_else(|| ConfigError::malformed(name, "a non-negative integer")),
        }
    }

    /// Number parameter, or `default` when absent
    ///
    /// # Errors
    ///
    /// [`ConfigError::MalformedParameter`] when present but not a number.
    pub fn param_f64(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        match self.params.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| ConfigError::malformed(name, "a number")),
        }
    }

    /// Required string parameter
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingParameter`] or
    /// [`ConfigError::MalformedParameter`].
    pub fn param_str(&self, name: &str) -> Result<&str, ConfigError> {
        match self.params.get(name) {
            None | Some(Value::Null) => Err(ConfigError::MissingParameter(name.to_string())),
            Some(value) => value
                .as_str()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ConfigError::malformed(name, "a non-empty string")),
        }
    }

    /// List of non-negative integers, or `default` when absent
    ///
    /// # Errors
    ///
    /// [`ConfigError::MalformedParameter`] when present but not such a list.
    pub fn param_usize_list(&self, name: &str, default: &[usize]) -> Result<Vec<usize>, ConfigError> {
        let malformed = || ConfigError::malformed(name, "a list of non-negative integers");
        match self.params.get(name) {
            None | Some(Value::Null) => Ok(default.to_vec()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_u64().and_then(|n| usize::try_from(n).ok()).ok_or_else(malformed))
                .collect(),
            Some(_) => Err(malformed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let rule: ValidationRule = serde_json::from_str(r#"{"strategy": "eircode_valid"}"#).unwrap();
        assert!(rule.field_names.is_empty());
        assert!(rule.params.is_empty());
    }

    #[test]
    fn typed_params() {
        let rule: ValidationRule = serde_json::from_str(
            r#"{"strategy": "s", "field_names": ["a"],
                "params": {"max": 3, "tolerance": 0.05, "exclusive_field": "none",
                           "num_characters": [7, 8], "bad": "x"}}"#,
        )
        .unwrap();
        assert_eq!(rule.param_u64("max", 1).unwrap(), 3);
        assert_eq!(rule.param_u64("absent", 1).unwrap(), 1);
        assert!((rule.param_f64("tolerance", 0.01).unwrap() - 0.05).abs() < f64::EPSILON);
        assert_eq!(rule.param_str("exclusive_field").unwrap(), "none");
        assert_eq!(rule.param_usize_list("num_characters", &[1]).unwrap(), vec![7, 8]);

        assert!(matches!(rule.param_u64("bad", 1), Err(ConfigError::MalformedParameter { .. })));
        assert!(matches!(rule.param_str("absent"), Err(ConfigError::MissingParameter(_))));
        assert!(matches!(
            rule.param_usize_list("bad", &[1]),
            Err(ConfigError::MalformedParameter { .. })
        ));
    }
}
