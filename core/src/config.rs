//! Runtime configuration loaded from TOML.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::schema::DEFAULT_MAX_DEPTH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntelConfig {
    /// Directory walked for `*.json` evidence files at startup.
    pub data_dir: PathBuf,
    /// Default target of `export_registry`.
    pub export_path: PathBuf,
    pub schema: SchemaConfig,
    pub discovery: DiscoveryConfig,
    pub dispatch: DispatchConfig,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            export_path: PathBuf::from("registry_export.json"),
            schema: SchemaConfig::default(),
            discovery: DiscoveryConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub max_depth: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Levels of nested object keys scanned below the top level.
    pub max_nesting_scan_depth: usize,
    pub follow_links: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_nesting_scan_depth: 1,
            follow_links: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Number of names listed in `available_types` for unknown requests.
    pub available_types_limit: usize,
    pub suggestion_limit: usize,
    /// Minimum Jaro-Winkler similarity for a name to be suggested.
    pub suggestion_threshold: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            available_types_limit: 20,
            suggestion_limit: 5,
            suggestion_threshold: 0.75,
        }
    }
}

impl IntelConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "schema.max_depth must be at least 1".to_string(),
            ));
        }
        if self.dispatch.available_types_limit == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.available_types_limit must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dispatch.suggestion_threshold) {
            return Err(ConfigError::Invalid(format!(
                "dispatch.suggestion_threshold must be within 0.0..=1.0, got {}",
                self.dispatch.suggestion_threshold
            )));
        }
        Ok(())
    }
}
