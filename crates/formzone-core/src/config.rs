//! Project configuration
//!
//! Read from `project_config.json` in the project folder; `.yaml`, `.yml`
//! and `.toml` variants are accepted with the same keys.

use crate::error::{FormzoneError, Result};
use formzone_validation::ValidationRule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File stem of the project configuration
pub const CONFIG_STEM: &str = "project_config";

/// Supported configuration encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
    /// `.toml`
    Toml,
}

impl ConfigFormat {
    /// Extensions tried, in order
    pub const EXTENSIONS: [&'static str; 4] = ["json", "yaml", "yml", "toml"];

    /// Format for a file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Per-project settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Validation rules, applied in order
    pub validations: Vec<ValidationRule>,
    /// Lookup list CSV, relative to the project folder
    pub lookup_list: Option<PathBuf>,
    /// Column of the lookup list that keys its rows
    pub lookup_prime_index: usize,
    /// Fields reviewed across the whole batch in QC
    pub always_review: Vec<String>,
    /// Text fields shown for quick review in QC
    pub quick_review: Vec<String>,
}

impl ProjectConfig {
    /// Decode configuration text
    ///
    /// # Errors
    ///
    /// [`FormzoneError::ConfigFile`] when the text does not decode.
    pub fn parse(text: &str, format: ConfigFormat, path: &Path) -> Result<Self> {
        let config = match format {
            ConfigFormat::Json => serde_json::from_str(text).map_err(|e| FormzoneError::config_file(path, e))?,
            ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| FormzoneError::config_file(path, e))?,
            ConfigFormat::Toml => toml::from_str(text).map_err(|e| FormzoneError::config_file(path, e))?,
        };
        Ok(config)
    }

    /// Load a configuration file, choosing the decoder by extension
    ///
    /// # Errors
    ///
    /// [`FormzoneError::Io`] or [`FormzoneError::ConfigFile`].
    pub fn load(path: &Path) -> Result<Self> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ConfigFormat::from_extension)
            .ok_or_else(|| FormzoneError::config_file(path, "unsupported extension"))?;
        let text = std::fs::read_to_string(path).map_err(|e| FormzoneError::io_error(path, e))?;
        let config = Self::parse(&text, format, path)?;
        info!(path = %path.display(), rules = config.validations.len(), "project config loaded");
        Ok(config)
    }

    /// Locate the configuration file in a project folder
    #[must_use]
    pub fn find(dir: &Path) -> Option<PathBuf> {
        ConfigFormat::EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{CONFIG_STEM}.{ext}")))
            .find(|path| path.is_file())
    }

    /// Load the project folder's configuration; none means defaults
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_dir(dir: &Path) -> Result<Self> {
        match Self::find(dir) {
            Some(path) => Self::load(&path),
            None => {
                debug!(dir = %dir.display(), "no project config, using defaults");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_validations_means_no_rules() {
        let config = ProjectConfig::parse("{}", ConfigFormat::Json, Path::new("c.json")).unwrap();
        assert!(config.validations.is_empty());
        assert_eq!(config.lookup_prime_index, 0);
    }

    #[test]
    fn json_yaml_and_toml_agree() {
        let json = r#"{"validations": [{"strategy": "max_tickboxes", "field_names": ["a", "b"],
                        "params": {"max": 1}}], "always_review": ["a"]}"#;
        let yaml = "validations:\n  - strategy: max_tickboxes\n    field_names: [a, b]\n    params:\n      max: 1\nalways_review: [a]\n";
        let toml = "always_review = [\"a\"]\n\n[[validations]]\nstrategy = \"max_tickboxes\"\nfield_names = [\"a\", \"b\"]\nparams = { max = 1 }\n";

        let from_json = ProjectConfig::parse(json, ConfigFormat::Json, Path::new("c.json")).unwrap();
        let from_yaml = ProjectConfig::parse(yaml, ConfigFormat::Yaml, Path::new("c.yaml")).unwrap();
        let from_toml = ProjectConfig::parse(toml, ConfigFormat::Toml, Path::new("c.toml")).unwrap();
        assert_eq!(from_json, from_yaml);
        assert_eq!(from_json, from_toml);
        assert_eq!(from_json.validations[0].param_u64("max", 9).unwrap(), 1);
    }

    #[test]
    fn load_dir_finds_any_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ProjectConfig::load_dir(dir.path()).unwrap(), ProjectConfig::default());

        std::fs::write(dir.path().join("project_config.yml"), "lookup_prime_index: 2\n").unwrap();
        assert_eq!(ProjectConfig::load_dir(dir.path()).unwrap().lookup_prime_index, 2);
    }

    #[test]
    fn malformed_file_reports_path() {
        let err = ProjectConfig::parse("{", ConfigFormat::Json, Path::new("p/project_config.json")).unwrap_err();
        assert!(matches!(err, FormzoneError::ConfigFile { .. }));
        assert!(err.to_string().starts_with("project config p/project_config.json"));
    }
}
