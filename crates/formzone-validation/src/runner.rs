//! Rule runner
//!
//! [`ProjectValidator`] resolves a project's rules against the registry once
//! and then validates any number of records. A rule that cannot run is
//! skipped and reported; it never stops the remaining rules.

use crate::context::{Finding, ValidationContext, ValueSource};
use crate::error::ConfigError;
use crate::lookup::LookupTable;
use crate::registry::{StrategyFn, StrategyRegistry};
use crate::rule::ValidationRule;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A rule that was skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFailure {
    /// Position of the rule in the configuration
    pub index: usize,
    /// Strategy the rule names
    pub strategy: String,
    /// Why it was skipped
    #[serde(serialize_with = "as_display")]
    pub error: ConfigError,
}

fn as_display<S: serde::Serializer>(error: &ConfigError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Result of validating one record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationRun {
    /// Findings in rule order, without exact duplicates
    pub findings: Vec<Finding>,
    /// Rules skipped for this record
    pub failures: Vec<RuleFailure>,
}

impl ValidationRun {
    /// No findings and no failures
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.failures.is_empty()
    }
}

struct ResolvedRule<'a> {
    index: usize,
    rule: &'a ValidationRule,
    strategy: StrategyFn,
}

/// Rules of one project, resolved and ready to run
pub struct ProjectValidator<'a> {
    rules: Vec<ResolvedRule<'a>>,
    load_failures: Vec<RuleFailure>,
    lookup: Option<&'a LookupTable>,
    field_to_page: &'a HashMap<String, u32>,
}

impl<'a> ProjectValidator<'a> {
    /// Resolve `rules` against `registry`
    ///
    /// Rules naming an unknown strategy, or a field absent from
    /// `field_to_page`, are set aside as load failures.
    #[must_use]
    pub fn new(
        registry: &StrategyRegistry,
        rules: &'a [ValidationRule],
        lookup: Option<&'a LookupTable>,
        field_to_page: &'a HashMap<String, u32>,
    ) -> Self {
        let mut resolved = Vec::with_capacity(rules.len());
        let mut load_failures = Vec::new();
        for (index, rule) in rules.iter().enumerate() {
            let checked = registry.resolve(&rule.strategy).and_then(|strategy| {
                match rule.field_names.iter().find(|f| !field_to_page.contains_key(f.as_str())) {
                    Some(unknown) => Err(ConfigError::UnknownField(unknown.clone())),
                    None => Ok(strategy),
                }
            });
            match checked {
                Ok(strategy) => resolved.push(ResolvedRule { index, rule, strategy }),
                Err(error) => {
                    warn!(index, strategy = %rule.strategy, %error, "validation rule skipped");
                    load_failures.push(RuleFailure {
                        index,
                        strategy: rule.strategy.clone(),
                        error,
                    });
                }
            }
        }
        debug!(rules = resolved.len(), skipped = load_failures.len(), "validator ready");
        Self {
            rules: resolved,
            load_failures,
            lookup,
            field_to_page,
        }
    }

    /// Rules set aside when the validator was built
    #[inline]
    #[must_use]
    pub fn load_failures(&self) -> &[RuleFailure] {
        &self.load_failures
    }

    /// Number of rules that will run
    #[inline]
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Apply every resolved rule to one record's values
    ///
    /// Load failures are repeated in every run so callers see them per
    /// record; strategy errors are added after them.
    #[must_use]
    pub fn validate(&self, values: &dyn ValueSource) -> ValidationRun {
        let mut run = ValidationRun {
            findings: Vec::new(),
            failures: self.load_failures.clone(),
        };
        let mut seen = HashSet::new();
        for resolved in &self.rules {
            let ctx = ValidationContext {
                values,
                rule: resolved.rule,
                field_to_page: self.field_to_page,
                lookup: self.lookup,
            };
            match (resolved.strategy)(&ctx) {
                Ok(findings) => {
                    for finding in findings {
                        if seen.insert(finding.clone()) {
                            run.findings.push(finding);
                        }
                    }
                }
                Err(error) => {
                    warn!(index = resolved.index, strategy = %resolved.rule.strategy, %error, "validation rule failed");
                    run.failures.push(RuleFailure {
                        index: resolved.index,
                        strategy: resolved.rule.strategy.clone(),
                        error,
                    });
                }
            }
        }
        run
    }
}
