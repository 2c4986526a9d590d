use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DATABASE_PATH: &str = "material_sync.db";
pub const ENV_PREFIX: &str = "MATSYNC";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub database_path: String,
    /// Token applied to every commit when no resolver is supplied by the caller.
    #[serde(default)]
    pub partition_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            partition_token: None,
        }
    }
}

/// Load `Config.toml` from the working directory (if present), overlaid with
/// `MATSYNC_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    build_configuration(
        ConfigFile::with_name("Config").required(false),
        Environment::with_prefix(ENV_PREFIX),
    )
}

pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    build_configuration(
        ConfigFile::from(path).required(true),
        Environment::with_prefix(ENV_PREFIX),
    )
}

fn build_configuration<F>(file: F, env: Environment) -> Result<AppConfig, ConfigError>
where
    F: config::Source + Send + Sync + 'static,
{
    let builder = Config::builder()
        .set_default("database_path", DEFAULT_DATABASE_PATH)?
        .add_source(file)
        .add_source(env)
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn empty_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
    }

    #[test]
    fn test_defaults_without_file() {
        let config = build_configuration(
            ConfigFile::with_name("does-not-exist-anywhere").required(false),
            empty_env(),
        )
        .unwrap();
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert!(config.partition_token.is_none());
    }

    #[test]
    fn test_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "database_path = \"/tmp/materials.db\"").unwrap();
        writeln!(file, "partition_token = \"42\"").unwrap();

        let config = build_configuration(ConfigFile::from(path.as_path()), empty_env()).unwrap();
        assert_eq!(config.database_path, "/tmp/materials.db");
        assert_eq!(config.partition_token.as_deref(), Some("42"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Config.toml");
        std::fs::write(&path, "database_path = \"from_file.db\"\n").unwrap();

        let mut vars = HashMap::new();
        vars.insert("MATSYNC_DATABASE_PATH".to_string(), "from_env.db".to_string());
        let env = Environment::with_prefix(ENV_PREFIX).source(Some(vars));

        let config = build_configuration(ConfigFile::from(path.as_path()), env).unwrap();
        assert_eq!(config.database_path, "from_env.db");
    }
}
