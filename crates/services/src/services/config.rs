use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::query_cache::CacheConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Console settings. File values are overridden by `OPS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Extra attempts for failed reads. Writes are never retried.
    pub fetch_retries: usize,
    /// Seconds a read stays fresh; unset keeps reads fresh until invalidated.
    pub stale_time_secs: Option<u64>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            fetch_retries: 0,
            stale_time_secs: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub const ENV_BASE_URL: &'static str = "OPS_API_BASE_URL";
    pub const ENV_TIMEOUT: &'static str = "OPS_REQUEST_TIMEOUT_SECS";
    pub const ENV_RETRIES: &'static str = "OPS_FETCH_RETRIES";
    pub const ENV_STALE_TIME: &'static str = "OPS_STALE_TIME_SECS";
    pub const ENV_LOG_LEVEL: &'static str = "OPS_LOG_LEVEL";

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.check()?;
        Ok(config)
    }

    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(Self::ENV_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup(Self::ENV_TIMEOUT) {
            self.request_timeout_secs = parse_number(Self::ENV_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(Self::ENV_RETRIES) {
            self.fetch_retries = parse_number(Self::ENV_RETRIES, &raw)?;
        }
        if let Some(raw) = lookup(Self::ENV_STALE_TIME) {
            self.stale_time_secs = match raw.trim() {
                "" | "none" => None,
                value => Some(parse_number(Self::ENV_STALE_TIME, value)?),
            };
        }
        if let Some(level) = lookup(Self::ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        self.check()
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "api_base_url",
                value: self.api_base_url.clone(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "request_timeout_secs",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            stale_time: self.stale_time_secs.map(Duration::from_secs),
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_file_values_fill_in_defaults() {
        let config = Config::from_toml_str(
            r#"
            api_base_url = "https://ops.example.com"
            stale_time_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://ops.example.com");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.cache_config().stale_time, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml_str("base = 'x'"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_environment_overrides_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            (Config::ENV_BASE_URL, "http://10.0.0.2:8080"),
            (Config::ENV_RETRIES, "2"),
            (Config::ENV_STALE_TIME, "none"),
        ]);
        let mut config = Config {
            stale_time_secs: Some(5),
            ..Config::default()
        };
        config
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_base_url, "http://10.0.0.2:8080");
        assert_eq!(config.fetch_retries, 2);
        assert_eq!(config.stale_time_secs, None);
    }

    #[test]
    fn test_bad_numbers_name_the_variable() {
        let mut config = Config::default();
        let err = config
            .apply_env(|name| (name == Config::ENV_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();
        let ConfigError::InvalidValue { name, value } = err else {
            panic!("expected an invalid value error");
        };
        assert_eq!(name, Config::ENV_TIMEOUT);
        assert_eq!(value, "soon");
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
