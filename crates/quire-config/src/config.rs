//! Configuration types

use quire_core::{DescriptorError, Dialect, TargetDescriptor};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that failed to load
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not valid for its format
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// The file extension names no supported format
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A configured target does not parse as a descriptor for its dialect
    #[error("Invalid {dialect} target '{target}': {source}")]
    InvalidTarget {
        /// Dialect the target was configured for
        dialect: Dialect,
        /// The raw target text
        target: String,
        /// Why the descriptor was rejected
        #[source]
        source: DescriptorError,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Backend selection for one dialect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    /// Native target descriptor: a file path for SQL, a Bolt URI for Cypher
    pub target: Option<String>,
    /// Try a host-registered bridge before any native connection
    pub use_bridge: bool,
    /// Fall back to the built-in dataset when every other strategy fails
    pub fallback_to_builtin: bool,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            target: None,
            use_bridge: true,
            fallback_to_builtin: true,
        }
    }
}

impl DialectConfig {
    /// Settings pointing at a native target
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::default()
        }
    }

    /// Parse the configured target, if any
    pub fn descriptor(&self, dialect: Dialect) -> ConfigResult<Option<TargetDescriptor>> {
        let Some(target) = self.target.as_deref() else {
            return Ok(None);
        };
        TargetDescriptor::parse(dialect, target)
            .map(Some)
            .map_err(|source| ConfigError::InvalidTarget {
                dialect,
                target: target.to_string(),
                source,
            })
    }
}

/// Engine-wide configuration, one section per dialect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Relational backend selection
    pub sql: DialectConfig,
    /// Graph backend selection
    pub cypher: DialectConfig,
}

impl EngineConfig {
    /// Settings for one dialect
    pub fn dialect(&self, dialect: Dialect) -> &DialectConfig {
        match dialect {
            Dialect::Sql => &self.sql,
            Dialect::Cypher => &self.cypher,
        }
    }

    /// Mutable settings for one dialect
    pub fn dialect_mut(&mut self, dialect: Dialect) -> &mut DialectConfig {
        match dialect {
            Dialect::Sql => &mut self.sql,
            Dialect::Cypher => &mut self.cypher,
        }
    }

    /// Check that every configured target parses for its dialect
    pub fn validate(&self) -> ConfigResult<()> {
        for dialect in [Dialect::Sql, Dialect::Cypher] {
            self.dialect(dialect).descriptor(dialect)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_allow_every_strategy() {
        let config = EngineConfig::default();
        assert!(config.sql.use_bridge);
        assert!(config.cypher.fallback_to_builtin);
        assert!(config.sql.target.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"cypher": {"use_bridge": false}}"#).unwrap();
        assert!(!config.cypher.use_bridge);
        assert!(config.cypher.fallback_to_builtin);
        assert_eq!(config.sql, DialectConfig::default());
    }

    #[test]
    fn test_invalid_graph_target() {
        let config = EngineConfig {
            cypher: DialectConfig::with_target("bolt://localhost:7687"),
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTarget {
                dialect: Dialect::Cypher,
                ..
            }
        ));
    }

    #[test]
    fn test_descriptor_for_sql_path() {
        let settings = DialectConfig::with_target("library.db");
        assert_eq!(
            settings.descriptor(Dialect::Sql).unwrap(),
            Some(TargetDescriptor::Path(PathBuf::from("library.db")))
        );
    }
}
