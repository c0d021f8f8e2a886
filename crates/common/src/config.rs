//! Chain view configuration.
//!
//! Sources, lowest priority first: defaults, TOML file, environment.
//! CLI flags are layered on top by the agent.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const ENV_ALGOD_URL: &str = "DSTAKE_ALGOD_URL";
const ENV_ALGOD_TOKEN: &str = "DSTAKE_ALGOD_TOKEN";
const ENV_NOTICEBOARD_APP_ID: &str = "DSTAKE_NOTICEBOARD_APP_ID";
const ENV_TIMEOUT_MS: &str = "DSTAKE_TIMEOUT_MS";
const ENV_RETRY_COUNT: &str = "DSTAKE_RETRY_COUNT";
const ENV_RETRY_DELAY_MS: &str = "DSTAKE_RETRY_DELAY_MS";
const ENV_ROUND_CACHE_TTL_MS: &str = "DSTAKE_ROUND_CACHE_TTL_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{var} invalid: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Base URL of the algod REST API.
    pub algod_url: String,
    /// Sent as `X-Algo-API-Token` when present.
    pub algod_token: Option<String>,
    /// Marketplace registry application.
    pub noticeboard_app_id: u64,
    pub timeout_ms: u64,
    /// Extra attempts for transient transport errors. `0` surfaces the first failure.
    pub retry_count: u8,
    pub retry_delay_ms: u64,
    /// How long a fetched round stays fresh.
    pub round_cache_ttl_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            algod_url: "http://localhost:4001".to_string(),
            algod_token: None,
            noticeboard_app_id: 0,
            timeout_ms: 10_000,
            retry_count: 0,
            retry_delay_ms: 500,
            round_cache_ttl_ms: 2_000,
        }
    }
}

impl ChainConfig {
    /// Defaults overlaid with `DSTAKE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Overlay any `DSTAKE_*` environment variables onto `self`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var(ENV_ALGOD_URL) {
            self.algod_url = url;
        }
        if let Ok(token) = std::env::var(ENV_ALGOD_TOKEN) {
            self.algod_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(v) = parse_env::<u64>(ENV_NOTICEBOARD_APP_ID)? {
            self.noticeboard_app_id = v;
        }
        if let Some(v) = parse_env::<u64>(ENV_TIMEOUT_MS)? {
            self.timeout_ms = v;
        }
        if let Some(v) = parse_env::<u8>(ENV_RETRY_COUNT)? {
            self.retry_count = v;
        }
        if let Some(v) = parse_env::<u64>(ENV_RETRY_DELAY_MS)? {
            self.retry_delay_ms = v;
        }
        if let Some(v) = parse_env::<u64>(ENV_ROUND_CACHE_TTL_MS)? {
            self.round_cache_ttl_ms = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.algod_url.starts_with("http://") || self.algod_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "algod_url must start with http:// or https://, got '{}'",
                self.algod_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn round_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.round_cache_ttl_ms)
    }
}

/// Load config from a TOML file. Missing keys keep their defaults.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<ChainConfig, ConfigError> {
    let s = std::fs::read_to_string(path.as_ref())?;
    let cfg: ChainConfig = toml::from_str(&s)?;
    Ok(cfg)
}

fn parse_env<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let def = ChainConfig::default();
        assert_eq!(def.retry_count, 0);
        assert_eq!(def.round_cache_ttl(), Duration::from_millis(2_000));
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_partial() {
        use std::io::Write;
        let tmp = tempfile::NamedTempFile::new().expect("temp file");
        let toml = r#"
            algod_url = "https://mainnet-api.example.org"
            noticeboard_app_id = 2713948864
            retry_count = 2
        "#;
        let mut f = tmp.reopen().expect("reopen");
        write!(f, "{}", toml).expect("write");
        let cfg = load_from_file(tmp.path()).expect("load");
        assert_eq!(cfg.algod_url, "https://mainnet-api.example.org");
        assert_eq!(cfg.noticeboard_app_id, 2713948864);
        assert_eq!(cfg.retry_count, 2);
        // untouched keys keep defaults
        assert_eq!(cfg.timeout_ms, 10_000);
    }

    #[test]
    fn test_load_from_file_rejects_bad_types() {
        use std::io::Write;
        let tmp = tempfile::NamedTempFile::new().expect("temp file");
        let mut f = tmp.reopen().expect("reopen");
        write!(f, "noticeboard_app_id = \"not a number\"").expect("write");
        assert!(matches!(load_from_file(tmp.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let cfg = ChainConfig {
            algod_url: "localhost:4001".to_string(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    // Single test touching the environment to avoid races between tests.
    #[test]
    fn test_apply_env() {
        std::env::set_var(ENV_ALGOD_URL, "http://node.test:8080");
        std::env::set_var(ENV_NOTICEBOARD_APP_ID, "42");
        std::env::set_var(ENV_ALGOD_TOKEN, "");
        let cfg = ChainConfig::from_env().expect("env config");
        assert_eq!(cfg.algod_url, "http://node.test:8080");
        assert_eq!(cfg.noticeboard_app_id, 42);
        assert_eq!(cfg.algod_token, None);

        std::env::set_var(ENV_RETRY_COUNT, "many");
        assert!(matches!(
            ChainConfig::from_env(),
            Err(ConfigError::InvalidEnv { var: ENV_RETRY_COUNT, .. })
        ));

        for var in [ENV_ALGOD_URL, ENV_NOTICEBOARD_APP_ID, ENV_ALGOD_TOKEN, ENV_RETRY_COUNT] {
            std::env::remove_var(var);
        }
    }
}
