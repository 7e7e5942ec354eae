//! Strategy registry
//!
//! Provides [`StrategyRegistry`], the static mapping from the strategy names
//! used in project configuration to their implementations.

use crate::context::{Finding, ValidationContext};
use crate::error::ConfigError;
use crate::strategies;
use std::collections::HashMap;
use std::fmt;

/// Signature every strategy implements
pub type StrategyFn = fn(&ValidationContext<'_>) -> Result<Vec<Finding>, ConfigError>;

/// Registry of validation strategies by name
///
/// Built once at startup; rules are resolved against it before any record is
/// validated.
#[derive(Default, Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<String, StrategyFn>,
}

impl StrategyRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Create registry with the built-in strategies
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("max_tickboxes", strategies::max_tickboxes);
        registry.register("mutually_exclusive", strategies::mutually_exclusive);
        registry.register("value_exists_in_lookup", strategies::value_exists_in_lookup);
        registry.register("match_value_in_lookup", strategies::match_value_in_lookup);
        registry.register("numbers_nearly_equal", strategies::numbers_nearly_equal);
        registry.register("email_addresses_valid", strategies::email_addresses_valid);
        registry.register("phone_numbers_valid", strategies::phone_numbers_valid);
        registry.register("num_characters_valid", strategies::num_characters_valid);
        registry.register("eircode_valid", strategies::eircode_valid);
        registry.register("ni_postcode_valid", strategies::ni_postcode_valid);
        registry.register("sum_should_equal_total", strategies::sum_should_equal_total);
        registry
    }

    /// Register a strategy, replacing any previous one of the same name
    pub fn register(&mut self, name: &str, strategy: StrategyFn) {
        self.strategies.insert(name.to_string(), strategy);
    }

    /// Look up a strategy
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<StrategyFn> {
        self.strategies.get(name).copied()
    }

    /// Look up a strategy, failing for unknown names
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownStrategy`] if `name` is not registered.
    pub fn resolve(&self, name: &str) -> Result<StrategyFn, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownStrategy(name.to_string()))
    }

    /// Check if strategy exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Remove strategy
    #[inline]
    pub fn remove(&mut self, name: &str) -> bool {
        self.strategies.remove(name).is_some()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get number of registered strategies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}
