use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display settings shared by the diff engine and the thread views.
///
/// The defaults reproduce the admin console: Korean labels and Korean
/// Standard Time. Label tables here are overrides; anything not listed falls
/// back to the built-in vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct DisplayConfig {
    /// Offset used when rendering timestamps.
    utc_offset: FixedOffset,

    /// Label shown for `true`.
    pub yes_label: String,

    /// Label shown for `false`.
    pub no_label: String,

    /// Text shown in place of a soft-deleted record that still anchors
    /// replies.
    pub deleted_placeholder: String,

    /// Keys whose values are masked in diff output.
    ///
    /// Empty by default: the console shows every field as stored.
    pub redact_keys: BTreeSet<String>,

    /// Extra or replacement field labels, keyed by field name.
    pub field_labels: BTreeMap<String, String>,

    /// Extra or replacement enum labels, keyed by field name then value.
    pub enum_labels: BTreeMap<String, BTreeMap<String, String>>,
}

/// Korean Standard Time, in seconds east of UTC.
const KST_SECONDS: i32 = 9 * 3600;

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(KST_SECONDS).expect("+09:00 is in range")
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_offset(),
            yes_label: default_yes(),
            no_label: default_no(),
            deleted_placeholder: default_placeholder(),
            redact_keys: BTreeSet::new(),
            field_labels: BTreeMap::new(),
            enum_labels: BTreeMap::new(),
        }
    }
}

/// Errors raised while reading or writing a [`DisplayConfig`] file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file could not be written.
    #[error("failed to write config file {path}: {source}")]
    Write {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file is not valid TOML or has invalid values.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl DisplayConfig {
    /// Loads the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The offset timestamps are rendered in.
    #[must_use]
    pub const fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// Sets the offset timestamps are rendered in.
    pub const fn set_utc_offset(&mut self, offset: FixedOffset) {
        self.utc_offset = offset;
    }

    /// Whether values under this key are masked.
    #[must_use]
    pub fn is_redacted(&self, key: &str) -> bool {
        self.redact_keys.contains(key)
    }

    /// Looks up an overridden field label.
    #[must_use]
    pub fn field_label(&self, key: &str) -> Option<&str> {
        self.field_labels.get(key).map(String::as_str)
    }

    /// Looks up an overridden enum label.
    #[must_use]
    pub fn enum_label(&self, key: &str, value: &str) -> Option<&str> {
        self.enum_labels
            .get(key)
            .and_then(|labels| labels.get(value))
            .map(String::as_str)
    }
}

fn default_yes() -> String {
    "예".to_string()
}

fn default_no() -> String {
    "아니오".to_string()
}

fn default_placeholder() -> String {
    "삭제된 댓글입니다.".to_string()
}

fn default_offset_string() -> String {
    default_offset().to_string()
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// Offset such as `+09:00`.
        #[serde(default = "default_offset_string")]
        utc_offset: String,

        #[serde(default = "default_yes")]
        yes_label: String,

        #[serde(default = "default_no")]
        no_label: String,

        #[serde(default = "default_placeholder")]
        deleted_placeholder: String,

        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        redact_keys: BTreeSet<String>,

        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        field_labels: BTreeMap<String, String>,

        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        enum_labels: BTreeMap<String, BTreeMap<String, String>>,
    },
}

impl TryFrom<Versions> for DisplayConfig {
    type Error = String;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                utc_offset,
                yes_label,
                no_label,
                deleted_placeholder,
                redact_keys,
                field_labels,
                enum_labels,
            } => Ok(Self {
                utc_offset: utc_offset
                    .parse()
                    .map_err(|e| format!("invalid utc_offset '{utc_offset}': {e}"))?,
                yes_label,
                no_label,
                deleted_placeholder,
                redact_keys,
                field_labels,
                enum_labels,
            }),
        }
    }
}

impl From<DisplayConfig> for Versions {
    fn from(config: DisplayConfig) -> Self {
        Self::V1 {
            utc_offset: config.utc_offset.to_string(),
            yes_label: config.yes_label,
            no_label: config.no_label,
            deleted_placeholder: config.deleted_placeholder,
            redact_keys: config.redact_keys,
            field_labels: config.field_labels,
            enum_labels: config.enum_labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_file_returns_default() {
        let expected = DisplayConfig::default();
        let actual: DisplayConfig = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn default_offset_is_kst() {
        assert_eq!(
            DisplayConfig::default().utc_offset().local_minus_utc(),
            9 * 3600
        );
    }

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"_version = "1"
utc_offset = "+00:00"
yes_label = "Yes"
redact_keys = ["password"]

[field_labels]
title = "Title"

[enum_labels.priority]
HIGH = "High"
"#,
        )
        .unwrap();

        let config = DisplayConfig::load(file.path()).unwrap();

        assert_eq!(config.utc_offset().local_minus_utc(), 0);
        assert_eq!(config.yes_label, "Yes");
        assert_eq!(config.no_label, "아니오");
        assert!(config.is_redacted("password"));
        assert_eq!(config.field_label("title"), Some("Title"));
        assert_eq!(config.enum_label("priority", "HIGH"), Some("High"));
        assert_eq!(config.enum_label("priority", "LOW"), None);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("display.toml");

        let mut config = DisplayConfig::default();
        config.redact_keys.insert("newPassword".to_string());
        config
            .field_labels
            .insert("budget".to_string(), "예산".to_string());
        config.save(&path).unwrap();

        assert_eq!(DisplayConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = DisplayConfig::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
    }

    #[test]
    fn invalid_offset_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nutc_offset = \"Seoul\"\n")
            .unwrap();

        let error = DisplayConfig::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }
}
