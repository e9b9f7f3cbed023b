//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered in this order, later
//! sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `<dir>/routing.{toml,yaml,json}` (optional)
//! 3. `<dir>/routing.<environment>.{toml,yaml,json}` (optional)
//! 4. `ROUTING__*` environment variables, `__` separating nested keys
//!    (e.g. `ROUTING__CIRCUIT_BREAKER__FAILURE_THRESHOLD=3`)

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::RouterConfig;
use crate::error::Result;

const CONFIG_FILE_STEM: &str = "routing";
const ENV_PREFIX: &str = "ROUTING";
const ENV_SEPARATOR: &str = "__";

/// Loaded, validated configuration together with where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: RouterConfig,
    environment: String,
    config_directory: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection from the default directory
    pub fn load() -> Result<ConfigManager> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> Result<ConfigManager> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with an explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> Result<ConfigManager> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading routing configuration"
        );

        let built = ::config::Config::builder()
            .add_source(
                ::config::File::from(config_directory.join(CONFIG_FILE_STEM)).required(false),
            )
            .add_source(
                ::config::File::from(
                    config_directory.join(format!("{CONFIG_FILE_STEM}.{environment}")),
                )
                .required(false),
            )
            .add_source(Self::environment_source())
            .build()?;

        Self::finish(built, environment, Some(config_directory))
    }

    /// Load configuration from a single explicit file (format taken from its extension)
    pub fn load_from_file(path: &Path) -> Result<ConfigManager> {
        let environment = Self::detect_environment();

        debug!(path = %path.display(), "Loading routing configuration file");

        let built = ::config::Config::builder()
            .add_source(::config::File::from(path).required(true))
            .add_source(Self::environment_source())
            .build()?;

        Self::finish(built, &environment, path.parent().map(Path::to_path_buf))
    }

    /// Wrap an already constructed configuration after validating it
    pub fn from_config(config: RouterConfig, environment: &str) -> Result<ConfigManager> {
        config.validate()?;
        Ok(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: None,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn into_config(self) -> RouterConfig {
        self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> Option<&Path> {
        self.config_directory.as_deref()
    }

    /// Current environment from `ROUTING_ENV`, then `APP_ENV`, defaulting to development
    pub fn detect_environment() -> String {
        env::var("ROUTING_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("ROUTING_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn environment_source() -> ::config::Environment {
        ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("scoring.priority_capable_services")
    }

    fn finish(
        built: ::config::Config,
        environment: &str,
        config_directory: Option<PathBuf>,
    ) -> Result<ConfigManager> {
        let config: RouterConfig = built.try_deserialize()?;
        config.validate()?;

        debug!(
            environment = %environment,
            failure_threshold = config.circuit_breaker.failure_threshold,
            queue_tick_ms = config.queue.tick_interval_ms,
            "Routing configuration loaded"
        );

        Ok(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_directory_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().join("absent")), "test")
                .unwrap();
        assert_eq!(manager.config(), &RouterConfig::default());
        assert_eq!(manager.environment(), "test");
    }

    #[test]
    fn test_environment_overlay_overrides_base_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("routing.toml"),
            "[circuit_breaker]\nfailure_threshold = 7\ntimeout_ms = 1000\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("routing.test.toml"),
            "[circuit_breaker]\nfailure_threshold = 2\n",
        )
        .unwrap();

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();

        assert_eq!(manager.config().circuit_breaker.failure_threshold, 2);
        assert_eq!(manager.config().circuit_breaker.timeout_ms, 1000);
        assert_eq!(manager.config_directory(), Some(dir.path()));
    }

    #[test]
    fn test_from_config_validates() {
        let mut config = RouterConfig::default();
        config.queue.tick_interval_ms = 0;
        assert!(ConfigManager::from_config(config, "test").is_err());
        assert!(ConfigManager::from_config(RouterConfig::default(), "test").is_ok());
    }
}
