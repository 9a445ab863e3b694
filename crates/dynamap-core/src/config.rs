//! Runtime configuration.
//!
//! Configuration is plain data owned by whoever builds the `Registry`; there
//! is no process-wide instance. It can be built in code or read from TOML:
//!
//! ```toml
//! metadata = "strict"
//! max_nesting_depth = 4
//!
//! [encoding]
//! null_empty_string = true
//!
//! [throughput]
//! read = 10
//! write = 5
//! ```

use crate::{DEFAULT_MAX_NESTING_DEPTH, schema::Throughput};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("max_nesting_depth must be at least 1")]
    ZeroNestingDepth,
}

///
/// MetadataMode
///
/// How the tag parser treats annotations it cannot understand.
/// `Lenient` degrades them to defaults (and logs a warning); `Strict`
/// reports them as `MetadataError`.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataMode {
    #[default]
    Lenient,
    Strict,
}

impl MetadataMode {
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

///
/// EncodingConfig
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// Encode empty strings as `NULL` instead of `S("")`.
    pub null_empty_string: bool,
}

///
/// Config
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub metadata: MetadataMode,
    pub encoding: EncodingConfig,
    pub max_nesting_depth: usize,

    /// Table-level throughput sent with create requests.
    pub throughput: Throughput,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::ZeroNestingDepth);
        }

        Ok(())
    }

    #[must_use]
    pub fn strict() -> Self {
        Self {
            metadata: MetadataMode::Strict,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_metadata(mut self, mode: MetadataMode) -> Self {
        self.metadata = mode;
        self
    }

    #[must_use]
    pub const fn with_throughput(mut self, throughput: Throughput) -> Self {
        self.throughput = throughput;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata: MetadataMode::default(),
            encoding: EncodingConfig::default(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            throughput: Throughput::default(),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_toml_str("").expect("empty config parses");

        assert_eq!(config, Config::default());
        assert_eq!(config.metadata, MetadataMode::Lenient);
        assert_eq!(config.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
    }

    #[test]
    fn full_document_overrides_every_section() {
        let config = Config::from_toml_str(
            r#"
            metadata = "strict"
            max_nesting_depth = 3

            [encoding]
            null_empty_string = true

            [throughput]
            read = 10
            write = 2
            "#,
        )
        .expect("config parses");

        assert!(config.metadata.is_strict());
        assert_eq!(config.max_nesting_depth, 3);
        assert!(config.encoding.null_empty_string);
        assert_eq!(config.throughput, Throughput { read: 10, write: 2 });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("metdata = \"strict\"").unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn zero_nesting_depth_is_rejected() {
        let err = Config::from_toml_str("max_nesting_depth = 0").unwrap_err();

        assert!(matches!(err, ConfigError::ZeroNestingDepth));
    }
}
