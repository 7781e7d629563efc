//! Configuration loading

use crate::config::{ConfigError, ConfigResult, EngineConfig};
use quire_core::Dialect;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable overriding the SQL target
pub const SQL_TARGET_ENV: &str = "QUIRE_SQL_TARGET";
/// Environment variable overriding the Cypher target
pub const CYPHER_TARGET_ENV: &str = "QUIRE_CYPHER_TARGET";

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document
    Toml,
    /// JSON document
    Json,
}

impl ConfigFormat {
    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            other => Err(ConfigError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                other.to_string()
            })),
        }
    }
}

/// Loads [`EngineConfig`] from files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load, apply environment overrides, and validate
    pub async fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<EngineConfig> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        debug!(path = %path.display(), ?format, "Loading config");

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::from_str(&content, format)?;
        Self::apply_env_overrides(&mut config);
        config.validate()?;

        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file
    pub fn load_from_env() -> ConfigResult<EngineConfig> {
        let mut config = EngineConfig::default();
        Self::apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text in the given format
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str, format: ConfigFormat) -> ConfigResult<EngineConfig> {
        match format {
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            #[cfg(not(feature = "toml"))]
            ConfigFormat::Toml => Err(ConfigError::UnsupportedFormat(
                "toml (feature disabled)".to_string(),
            )),
        }
    }

    /// Apply `QUIRE_SQL_TARGET` / `QUIRE_CYPHER_TARGET` from the process environment
    pub fn apply_env_overrides(config: &mut EngineConfig) {
        Self::apply_overrides_with(config, |key| std::env::var(key).ok());
    }

    /// Apply target overrides from an arbitrary lookup. Blank values are ignored.
    pub fn apply_overrides_with<F>(config: &mut EngineConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (dialect, key) in [(Dialect::Sql, SQL_TARGET_ENV), (Dialect::Cypher, CYPHER_TARGET_ENV)] {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                debug!(%dialect, env = key, "Target overridden from environment");
                config.dialect_mut(dialect).target = Some(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test_case("quire.toml", Some(ConfigFormat::Toml))]
    #[test_case("quire.JSON", Some(ConfigFormat::Json))]
    #[test_case("quire.yaml", None)]
    #[test_case("quire", None)]
    fn test_format_from_path(path: &str, expected: Option<ConfigFormat>) {
        assert_eq!(ConfigFormat::from_path(Path::new(path)).ok(), expected);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml() {
        let config = ConfigLoader::from_str(
            r#"
[sql]
target = "library.db"

[cypher]
fallback_to_builtin = false
"#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.sql.target.as_deref(), Some("library.db"));
        assert!(config.sql.use_bridge);
        assert!(!config.cypher.fallback_to_builtin);
    }

    #[test]
    fn test_malformed_json() {
        let result = ConfigLoader::from_str("{ sql: ", ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_overrides_replace_targets() {
        let env: HashMap<&str, &str> = [
            (SQL_TARGET_ENV, "override.db"),
            (CYPHER_TARGET_ENV, "   "),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.cypher.target = Some("bolt://u:p@localhost:7687".to_string());
        ConfigLoader::apply_overrides_with(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.sql.target.as_deref(), Some("override.db"));
        assert_eq!(
            config.cypher.target.as_deref(),
            Some("bolt://u:p@localhost:7687")
        );
    }
}
