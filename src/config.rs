//! Configuration loading.
//!
//! [`DatabaseConfig`] is read from `config/config.toml` (optional) layered
//! under `MOORING__*` environment variables, section `database`:
//!
//! ```toml
//! [database]
//! path = "app.db"
//! table_case = "snake_case"
//! column_case = "camelCase"
//! ```
//!
//! The same keys can be set as `MOORING__DATABASE__PATH` and so on.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use log::warn;
use serde::Deserialize;

use crate::schema::Case;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "MOORING";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path; `:memory:` opens an in-memory database.
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub table_case: Case,
    #[serde(default)]
    pub column_case: Case,
}

fn default_path() -> String {
    ":memory:".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            table_case: Case::default(),
            column_case: Case::default(),
        }
    }
}

impl DatabaseConfig {
    /// Load from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // A file that exists but cannot be read is reported, then ignored.
                if Path::new(CONFIG_FILE).exists() {
                    warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        Self::from_settings(&settings)
    }

    /// Load from an explicit configuration file only.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;
        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<DatabaseConfig>("database") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Database configuration could not be loaded from file or environment: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            "[database]\npath = \"app.db\"\ncolumn_case = \"camelCase\"\n",
        );
        let config = DatabaseConfig::load_from(file.path()).unwrap();
        assert_eq!(config.path, "app.db");
        assert_eq!(config.table_case, Case::SnakeCase);
        assert_eq!(config.column_case, Case::CamelCase);
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let file = write_config("[other]\nkey = 1\n");
        let config = DatabaseConfig::load_from(file.path()).unwrap();
        assert_eq!(config, DatabaseConfig::default());
        assert_eq!(config.path, ":memory:");
    }

    #[test]
    fn test_invalid_case_is_an_error() {
        let file = write_config("[database]\ntable_case = \"SCREAMING\"\n");
        assert!(DatabaseConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = DatabaseConfig::load().unwrap();
        assert!(!config.path.is_empty());
    }
}
