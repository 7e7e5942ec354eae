//! Project context
//!
//! A [`Project`] is constructed at project open and passed by reference to
//! everything that needs the schema, the validation registry or the lookup
//! list. Nothing here is global.

use crate::batch::{Batch, BatchOpenReport};
use crate::config::ProjectConfig;
use crate::error::{FormzoneError, Result};
use crate::events::{ChangeEvent, EventBus};
use formzone_schema::{DesignStrategy, ProjectSchema, SchemaChange, SchemaError};
use formzone_validation::{LookupTable, ProjectValidator, StrategyRegistry};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Folder holding one JSON file per page
pub const SCHEMA_DIR: &str = "json";

/// Preset QC comments, one per line
pub const PRESETS_FILE: &str = "qc_comments.txt";

/// An open project: schema, configuration, rules and lookup list
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    schema: RwLock<ProjectSchema>,
    config: ProjectConfig,
    registry: StrategyRegistry,
    lookup: Option<LookupTable>,
    presets: Vec<String>,
    events: EventBus,
}

impl Project {
    /// In-memory project over an already built schema
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, schema: ProjectSchema, config: ProjectConfig) -> Self {
        Self {
            root: root.into(),
            schema: RwLock::new(schema),
            config,
            registry: StrategyRegistry::with_defaults(),
            lookup: None,
            presets: Vec::new(),
            events: EventBus::default(),
        }
    }

    /// Open a project folder
    ///
    /// Reads `json/<page>.json`, the project config, the configured lookup
    /// list and `qc_comments.txt` when present.
    ///
    /// # Errors
    ///
    /// Schema, configuration or lookup list errors. A configured lookup list
    /// that cannot be read fails the open.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let schema = ProjectSchema::load_dir(&root.join(SCHEMA_DIR))?;
        let config = ProjectConfig::load_dir(&root)?;
        let lookup = match &config.lookup_list {
            Some(list) => Some(LookupTable::load(&root.join(list), config.lookup_prime_index)?),
            None => None,
        };
        let presets = read_presets(&root.join(PRESETS_FILE))?;

        info!(
            root = %root.display(),
            pages = schema.page_count(),
            columns = schema.columns().len(),
            rules = config.validations.len(),
            presets = presets.len(),
            "project opened"
        );
        let mut project = Self::new(root, schema, config);
        project.lookup = lookup;
        project.presets = presets;
        Ok(project)
    }

    /// Use this lookup list for lookup strategies
    #[must_use]
    pub fn with_lookup(mut self, lookup: LookupTable) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Use this registry instead of the built-in one
    #[must_use]
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Project folder
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read access to the schema
    #[inline]
    pub fn schema(&self) -> RwLockReadGuard<'_, ProjectSchema> {
        self.schema.read()
    }

    /// Project configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Validation strategy registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Lookup list, when configured
    #[inline]
    #[must_use]
    pub fn lookup(&self) -> Option<&LookupTable> {
        self.lookup.as_ref()
    }

    /// Preset QC comment texts
    #[inline]
    #[must_use]
    pub fn presets(&self) -> &[String] {
        &self.presets
    }

    /// Notification bus shared with this project's batches
    #[inline]
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Record header: column names in canonical order
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.schema.read().resolve_column_order()
    }

    /// Field name → page, built once per validation pass
    #[must_use]
    pub fn field_to_page(&self) -> HashMap<String, u32> {
        self.schema.read().field_to_page()
    }

    /// Resolve the configured rules against the registry
    #[must_use]
    pub fn validator<'a>(&'a self, field_to_page: &'a HashMap<String, u32>) -> ProjectValidator<'a> {
        ProjectValidator::new(&self.registry, &self.config.validations, self.lookup.as_ref(), field_to_page)
    }

    /// Apply a design-mode edit to the schema
    ///
    /// The edit runs under the schema write lock; each resulting change is
    /// published as a [`ChangeEvent::Schema`].
    ///
    /// # Errors
    ///
    /// The edit's [`SchemaError`].
    pub fn design<F>(&self, edit: F) -> Result<Vec<SchemaChange>>
    where
        F: FnOnce(&DesignStrategy, &mut ProjectSchema) -> Result<Vec<SchemaChange>, SchemaError>,
    {
        let changes = {
            let mut schema = self.schema.write();
            edit(&DesignStrategy, &mut *schema)?
        };
        for change in &changes {
            debug!(?change, "schema changed");
            self.events.publish(ChangeEvent::Schema(change.clone()));
        }
        Ok(changes)
    }

    /// Write the schema back to `json/<page>.json`
    ///
    /// # Errors
    ///
    /// [`FormzoneError::Schema`] when a page file cannot be written.
    pub fn save_schema(&self) -> Result<()> {
        self.schema.read().save_dir(&self.root.join(SCHEMA_DIR))?;
        Ok(())
    }

    /// Open a batch of this project; see [`Batch::open`]
    ///
    /// # Errors
    ///
    /// See [`Batch::open`].
    pub fn open_batch(&self, path: impl Into<PathBuf>) -> Result<(Batch, BatchOpenReport)> {
        Batch::open(path, &self.schema.read(), self.events.clone())
    }
}

fn read_presets(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path).map_err(|e| FormzoneError::io_error(path, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
