//! # Configuration
//!
//! Session settings and the saveable merge configuration. A merge
//! configuration is stored as pretty-printed JSON with the field names the
//! merge tool has always used, so files saved by earlier versions (single
//! `join_key_a`/`join_key_b` keys, `"anti A vs B"` labels) still load.
use crate::error::RustyMergeError;
use crate::join::{JoinMode, JoinSpec, DEFAULT_SUFFIXES};
use crate::loader::{LoadOptions, DEFAULT_MAX_FILE_SIZE_MB};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised by settings and merge configurations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Join type name not recognised
    #[error("Unknown join type '{0}'")]
    UnknownJoinMode(String),

    /// Configuration holds no key column for a side
    #[error("Configuration has no key columns for table {side}")]
    MissingKeys { side: String },

    /// Both suffixes are the same, so collisions cannot be resolved
    #[error("Suffixes must differ, got '{suffix_a}' and '{suffix_b}'")]
    InvalidSuffixes { suffix_a: String, suffix_b: String },

    /// Size limit of zero
    #[error("Maximum file size must be at least 1 MB")]
    InvalidMaxFileSize,
}

fn default_suffixes() -> (String, String) {
    (DEFAULT_SUFFIXES.0.to_owned(), DEFAULT_SUFFIXES.1.to_owned())
}

fn check_suffixes(suffixes: &(String, String)) -> Result<(), ConfigError> {
    if suffixes.0 == suffixes.1 {
        return Err(ConfigError::InvalidSuffixes {
            suffix_a: suffixes.0.to_owned(),
            suffix_b: suffixes.1.to_owned(),
        });
    }
    Ok(())
}

/// Settings that apply to a whole session.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Largest accepted input file, in megabytes
    pub max_file_size_mb: usize,
    /// Read every cell as displayed text instead of inferring types
    pub preserve_format: bool,
    /// Trim surrounding whitespace of text cells right after loading
    pub normalize: bool,
    /// Suffixes for colliding column names of A and B
    pub suffixes: (String, String),
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            preserve_format: true,
            normalize: false,
            suffixes: default_suffixes(),
        }
    }
}

impl Settings {
    /// Checks the size limit and the suffixes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size_mb == 0 {
            return Err(ConfigError::InvalidMaxFileSize);
        }
        check_suffixes(&self.suffixes)
    }

    /// Load options derived from these settings.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            sheet_name: None,
            preserve_format: self.preserve_format,
            max_size_bytes: Some(self.max_file_size_mb.saturating_mul(1024 * 1024)),
        }
    }
}

/// Saveable merge configuration: keys per side, join type and suffixes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// First key of table A, kept for single-key configurations
    #[serde(default)]
    pub join_key_a: Option<String>,
    /// First key of table B, kept for single-key configurations
    #[serde(default)]
    pub join_key_b: Option<String>,
    /// Key columns of table A
    #[serde(default)]
    pub join_keys_a: Vec<String>,
    /// Key columns of table B
    #[serde(default)]
    pub join_keys_b: Vec<String>,
    /// Whether more than one key pair is used
    #[serde(default)]
    pub use_multiple_keys: bool,
    /// Join type; inner when missing
    #[serde(default)]
    pub join_type: Option<JoinMode>,
    #[serde(default = "default_suffixes")]
    pub suffixes: (String, String),
}

impl From<&JoinSpec> for MergeConfig {
    fn from(spec: &JoinSpec) -> Self {
        MergeConfig {
            join_key_a: spec.keys_a.first().cloned(),
            join_key_b: spec.keys_b.first().cloned(),
            join_keys_a: spec.keys_a.clone(),
            join_keys_b: spec.keys_b.clone(),
            use_multiple_keys: spec.keys_a.len() > 1,
            join_type: Some(spec.mode),
            suffixes: spec.suffixes.clone(),
        }
    }
}

impl MergeConfig {
    /// Key list of one side, falling back to the single-key field.
    fn keys(keys: &[String], single: &Option<String>, side: &str) -> Result<Vec<String>, ConfigError> {
        if !keys.is_empty() {
            Ok(keys.to_vec())
        } else if let Some(key) = single {
            Ok(vec![key.to_owned()])
        } else {
            Err(ConfigError::MissingKeys {
                side: side.to_owned(),
            })
        }
    }

    /// Builds the join specification this configuration describes.
    pub fn to_spec(&self) -> Result<JoinSpec, ConfigError> {
        check_suffixes(&self.suffixes)?;
        let keys_a = Self::keys(&self.join_keys_a, &self.join_key_a, "A")?;
        let keys_b = Self::keys(&self.join_keys_b, &self.join_key_b, "B")?;
        let spec = JoinSpec::new(keys_a, keys_b, self.join_type.unwrap_or_default())
            .with_suffixes(&self.suffixes.0, &self.suffixes.1);
        Ok(spec)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, RustyMergeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<MergeConfig, RustyMergeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the configuration to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RustyMergeError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        debug!("Saved merge configuration to '{}'", path.as_ref().display());
        Ok(())
    }

    /// Reads a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<MergeConfig, RustyMergeError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        debug!("Loaded merge configuration from '{}'", path.as_ref().display());
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_json() {
        let spec = JoinSpec::new(["id", "region"], ["customer_id", "region"], JoinMode::AntiBNotA);
        let config = MergeConfig::from(&spec);
        let json = config.to_json().unwrap();
        assert!(json.contains("\"join_type\": \"anti_b_not_a\""));
        let parsed = MergeConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.to_spec().unwrap(), spec);
    }

    #[test]
    fn legacy_single_key_configuration_loads() {
        let json = r#"{
            "join_key_a": "id",
            "join_key_b": "code",
            "join_keys_a": [],
            "join_keys_b": [],
            "use_multiple_keys": false,
            "join_type": "anti A vs B",
            "suffixes": ["_left", "_right"]
        }"#;
        let spec = MergeConfig::from_json(json).unwrap().to_spec().unwrap();
        assert_eq!(spec.keys_a, vec!["id"]);
        assert_eq!(spec.keys_b, vec!["code"]);
        assert_eq!(spec.mode, JoinMode::AntiANotB);
        assert_eq!(spec.suffixes, ("_left".to_owned(), "_right".to_owned()));
    }

    #[test]
    fn configuration_without_keys_is_rejected() {
        let config = MergeConfig::from_json(r#"{"join_type": null}"#).unwrap();
        assert_eq!(config.join_type, None);
        assert_eq!(
            config.to_spec(),
            Err(ConfigError::MissingKeys { side: "A".to_owned() })
        );
    }

    #[test]
    fn unknown_join_type_fails_to_parse() {
        assert!(MergeConfig::from_json(r#"{"join_type": "sideways"}"#).is_err());
    }

    #[test]
    fn settings_defaults_and_checks() {
        let settings = Settings::default();
        assert_eq!(settings.max_file_size_mb, 100);
        assert!(settings.preserve_format);
        assert_eq!(settings.load_options().max_size_bytes, Some(100 * 1024 * 1024));
        assert!(settings.validate().is_ok());

        let same = Settings {
            suffixes: ("_x".to_owned(), "_x".to_owned()),
            ..Settings::default()
        };
        assert!(matches!(same.validate(), Err(ConfigError::InvalidSuffixes { .. })));
    }
}
