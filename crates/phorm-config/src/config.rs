//! Configuration types and loading for the phorm system.
//!
//! The main entry point is [`PhormConfig`], which represents the contents
//! of `.phorm/config.yaml`. Configuration is loaded with [`load_config`]
//! and saved with [`save_config`].

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use phorm_core::lookup::TableLookup;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration file contained invalid YAML.
    #[error("failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// The `.phorm/` directory was not found.
    #[error("no .phorm directory found (run 'phorm init' first)")]
    PhormDirNotFound,
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Listing configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    /// Default page size for paginated listings.
    #[serde(default = "default_page_size", rename = "page-size")]
    pub page_size: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full phorm configuration, corresponding to `.phorm/config.yaml`.
///
/// All fields use `serde` defaults so a partially-specified YAML file
/// deserializes with sensible default values.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhormConfig {
    /// Database path override.
    #[serde(default)]
    pub db: Option<String>,

    /// Actor identity override.
    #[serde(default)]
    pub actor: Option<String>,

    /// Output JSON instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    /// Listing configuration.
    #[serde(default)]
    pub list: ListConfig,

    /// Static lookup tables keyed by lookup key, then by source value.
    /// These back lookup dependencies without an external catalog service.
    #[serde(default)]
    pub lookups: HashMap<String, HashMap<String, String>>,
}

impl PhormConfig {
    /// Builds a [`TableLookup`] from the configured lookup tables.
    pub fn lookup_tables(&self) -> TableLookup {
        let mut tables = TableLookup::new();
        for (key, entries) in &self.lookups {
            for (source, resolved) in entries {
                tables.insert(key.clone(), source.clone(), resolved.clone());
            }
        }
        tables
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration from `config.yaml` inside the given `.phorm/` directory.
///
/// If the file does not exist, a default [`PhormConfig`] is returned.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
/// or [`ConfigError::ParseError`] if it contains invalid YAML.
pub fn load_config(phorm_dir: &Path) -> Result<PhormConfig> {
    let config_path = phorm_dir.join("config.yaml");

    if !config_path.exists() {
        return Ok(PhormConfig::default());
    }

    let content = std::fs::read_to_string(&config_path)?;

    // An empty file is valid and yields default config.
    if content.trim().is_empty() {
        return Ok(PhormConfig::default());
    }

    let config: PhormConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to `config.yaml` inside the given `.phorm/` directory.
///
/// The directory is created if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] on I/O failure or
/// [`ConfigError::ParseError`] if serialization fails.
pub fn save_config(phorm_dir: &Path, config: &PhormConfig) -> Result<()> {
    std::fs::create_dir_all(phorm_dir)?;

    let config_path = phorm_dir.join("config.yaml");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(config_path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use phorm_core::lookup::LookupProvider;
    use phorm_core::value::FieldValue;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let cfg = PhormConfig::default();
        assert!(cfg.db.is_none());
        assert!(cfg.actor.is_none());
        assert!(!cfg.json);
        assert_eq!(cfg.list.page_size, 20);
        assert!(cfg.lookups.is_empty());
    }

    #[test]
    fn test_load_missing_config_returns_default() {
        let dir = PathBuf::from("/nonexistent/path/.phorm");
        let cfg = load_config(&dir).unwrap();
        assert!(cfg.db.is_none());
    }

    #[test]
    fn test_roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let phorm_dir = dir.path().join(".phorm");

        let mut cfg = PhormConfig::default();
        cfg.actor = Some("qa-reviewer".to_string());
        cfg.list.page_size = 50;

        save_config(&phorm_dir, &cfg).unwrap();
        let loaded = load_config(&phorm_dir).unwrap();

        assert_eq!(loaded.actor.as_deref(), Some("qa-reviewer"));
        assert_eq!(loaded.list.page_size, 50);
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = "json: true\ndb: /tmp/phorm.db\n";
        let cfg: PhormConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.json);
        assert_eq!(cfg.db.as_deref(), Some("/tmp/phorm.db"));
        // Everything else should be default
        assert_eq!(cfg.list.page_size, 20);
    }

    #[test]
    fn test_lookup_tables_from_yaml() {
        let yaml = "lookups:\n  atc_codes:\n    aspirin: N02BA01\n    ibuprofen: M01AE01\n";
        let cfg: PhormConfig = serde_yaml::from_str(yaml).unwrap();
        let tables = cfg.lookup_tables();

        let hit = tables
            .resolve("atc_codes", &FieldValue::Text("aspirin".into()))
            .unwrap();
        assert_eq!(hit, Some(FieldValue::Text("N02BA01".into())));

        let miss = tables
            .resolve("atc_codes", &FieldValue::Text("unknown".into()))
            .unwrap();
        assert_eq!(miss, None);
    }
}
