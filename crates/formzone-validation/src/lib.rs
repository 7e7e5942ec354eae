//! Formzone Validation Engine
//!
//! A registry of named, parameterized strategies and a runner that applies
//! a project's configured rules to one record's captured values.
//!
//! # Overview
//!
//! - **ValidationRule**: `{strategy, field_names, params}` from configuration
//! - **StrategyRegistry**: static name → strategy mapping built at startup
//! - **ProjectValidator**: resolves rules once, then validates records and
//!   returns findings alongside per-rule configuration failures
//! - **LookupTable**: reference list for lookup strategies
//!
//! The runner never touches stored records; findings are merged into ledgers
//! by the caller.
//!
//! # Example
//!
//! ```rust
//! use formzone_validation::{ProjectValidator, StrategyRegistry, ValidationRule};
//! use std::collections::HashMap;
//!
//! let registry = StrategyRegistry::with_defaults();
//! let rules = vec![ValidationRule::new("max_tickboxes", ["a", "b"]).with_param("max", 1)];
//! let pages: HashMap<String, u32> = [("a".into(), 1), ("b".into(), 1)].into();
//! let validator = ProjectValidator::new(&registry, &rules, None, &pages);
//!
//! let values: HashMap<String, String> =
//!     [("a".into(), "Ticked".into()), ("b".into(), "Ticked".into())].into();
//! let run = validator.validate(&values);
//! assert_eq!(run.findings.len(), 1);
//! assert_eq!(run.findings[0].field, "b");
//! ```

#![warn(missing_docs)]

pub mod checks;
pub mod context;
pub mod error;
pub mod lookup;
pub mod registry;
pub mod rule;
pub mod runner;
pub mod strategies;

// Re-exports
pub use checks::{check_value, is_valid_date, ValueCheck, ValueFlag};
pub use context::{Finding, ValidationContext, ValueSource};
pub use error::ConfigError;
pub use lookup::LookupTable;
pub use registry::{StrategyFn, StrategyRegistry};
pub use rule::ValidationRule;
pub use runner::{ProjectValidator, RuleFailure, ValidationRun};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for validation
    pub use crate::{
        ConfigError, Finding, LookupTable, ProjectValidator, StrategyRegistry, ValidationRule,
        ValidationRun,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
