//! Directory layer configuration.
//!
//! Configuration is plain TOML. Every field has a default, so an empty
//! document describes the standard FoundationDB layout:
//!
//! ```toml
//! [directory]
//! node_prefix = "fe"
//! content_prefix = ""
//! allow_manual_prefixes = false
//!
//! [retry]
//! max_attempts = 100
//! ```

use std::path::Path;
use std::path::PathBuf;

use cairn_kv::RetryConfig;
use cairn_kv::RetryConfigError;
use cairn_layer::Subspace;
use cairn_layer::SubspaceError;
use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use snafu::Snafu;

use crate::constants::DEFAULT_NODE_PREFIX;

mod defaults {
    use super::*;

    pub fn node_prefix() -> String {
        hex::encode([DEFAULT_NODE_PREFIX])
    }

    pub fn content_prefix() -> String {
        String::new()
    }
}

/// Errors from loading a configuration.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[snafu(display("failed to read config file {}: {source}", path.display()))]
    ReadFile {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML document could not be parsed.
    #[snafu(display("failed to parse config: {source}"))]
    Parse {
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A prefix field is not valid hex.
    #[snafu(display("{field} is not valid hex: {source}"))]
    InvalidHex {
        /// Name of the offending field.
        field: &'static str,
        /// Underlying decode error.
        source: hex::FromHexError,
    },

    /// A prefix field lies in the reserved system range.
    #[snafu(display("{field} is not a usable prefix: {source}"))]
    InvalidPrefix {
        /// Name of the offending field.
        field: &'static str,
        /// Underlying subspace error.
        source: SubspaceError,
    },

    /// The retry section is invalid.
    #[snafu(display("invalid retry config: {source}"))]
    Retry {
        /// Underlying validation error.
        source: RetryConfigError,
    },
}

/// Where a [`DirectoryLayer`](crate::DirectoryLayer) keeps its metadata and
/// content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Hex-encoded prefix of the node (metadata) subspace.
    #[serde(default = "defaults::node_prefix")]
    pub node_prefix: String,

    /// Hex-encoded prefix under which directory prefixes are allocated.
    #[serde(default = "defaults::content_prefix")]
    pub content_prefix: String,

    /// Whether `create` may be given an explicit prefix.
    #[serde(default)]
    pub allow_manual_prefixes: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            node_prefix: defaults::node_prefix(),
            content_prefix: defaults::content_prefix(),
            allow_manual_prefixes: false,
        }
    }
}

impl DirectoryConfig {
    /// Parse a TOML document holding the directory fields at top level.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).context(ParseSnafu)?;
        config.node_subspace()?;
        config.content_subspace()?;
        Ok(config)
    }

    /// Decoded node subspace.
    pub fn node_subspace(&self) -> Result<Subspace, ConfigError> {
        decode_prefix("node_prefix", &self.node_prefix)
    }

    /// Decoded content subspace.
    pub fn content_subspace(&self) -> Result<Subspace, ConfigError> {
        decode_prefix("content_prefix", &self.content_prefix)
    }
}

fn decode_prefix(field: &'static str, value: &str) -> Result<Subspace, ConfigError> {
    let bytes = hex::decode(value).context(InvalidHexSnafu { field })?;
    Subspace::checked(bytes).context(InvalidPrefixSnafu { field })
}

/// Top-level configuration file: a `[directory]` and a `[retry]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CairnConfig {
    /// Directory layer layout.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Transaction retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl CairnConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).context(ParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        Self::from_toml_str(&contents)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.directory.node_subspace()?;
        self.directory.content_subspace()?;
        self.retry.validate().context(RetrySnafu)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_match_standard_layout() {
        let config = CairnConfig::from_toml_str("").unwrap();
        assert_eq!(config.directory.node_subspace().unwrap().raw_prefix(), &[0xFE]);
        assert!(config.directory.content_subspace().unwrap().raw_prefix().is_empty());
        assert!(!config.directory.allow_manual_prefixes);
        assert_eq!(config.retry, RetryConfig::default());
    }

    #[test]
    fn test_directory_section() {
        let config = CairnConfig::from_toml_str(
            r#"
            [directory]
            node_prefix = "0a0b"
            content_prefix = "0c"
            allow_manual_prefixes = true
            "#,
        )
        .unwrap();
        assert_eq!(config.directory.node_subspace().unwrap().raw_prefix(), &[0x0A, 0x0B]);
        assert_eq!(config.directory.content_subspace().unwrap().raw_prefix(), &[0x0C]);
        assert!(config.directory.allow_manual_prefixes);
    }

    #[test]
    fn test_rejects_bad_hex() {
        let err = DirectoryConfig::from_toml_str(r#"node_prefix = "zz""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHex { field: "node_prefix", .. }));
    }

    #[test]
    fn test_rejects_system_prefix() {
        let err = DirectoryConfig::from_toml_str(r#"content_prefix = "ff01""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrefix { field: "content_prefix", .. }));
    }

    #[test]
    fn test_rejects_bad_retry_section() {
        let err = CairnConfig::from_toml_str("[retry]\nmax_attempts = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Retry { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[directory]\ncontent_prefix = \"15\"").unwrap();

        let config = CairnConfig::load(file.path()).unwrap();
        assert_eq!(config.directory.content_prefix, "15");
        assert_eq!(config.directory.node_prefix, "fe");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CairnConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
