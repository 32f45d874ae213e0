//! Configuration module
//!
//! Client settings are layered: built-in defaults, then the TOML file, then
//! environment variables (a `.env` file in the working directory is loaded
//! first).

pub mod storage;

pub use storage::{ClientConfig, RetryConfig};

use crate::error::{AirtableError, Result};
use crate::http::RetryStrategy;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the access token
pub const ENV_API_KEY: &str = "AIRTABLE_API_KEY";

/// Environment variable overriding the endpoint
pub const ENV_ENDPOINT_URL: &str = "AIRTABLE_ENDPOINT_URL";

/// Environment variable overriding the timeout, in seconds
pub const ENV_TIMEOUT_SECS: &str = "AIRTABLE_TIMEOUT_SECS";

impl RetryConfig {
    /// Build the retry strategy these settings describe
    pub fn to_strategy(&self) -> RetryStrategy {
        RetryStrategy::default()
            .with_total(self.total)
            .with_backoff_factor(self.backoff_factor)
            .with_status_forcelist(self.status_forcelist.iter().copied())
            .with_max_backoff(Duration::from_secs(self.max_backoff_secs))
    }
}

impl ClientConfig {
    /// Apply environment overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_ENDPOINT_URL).filter(|u| !u.is_empty()) {
            self.endpoint_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).filter(|s| !s.is_empty()) {
            let secs = secs.trim().parse().map_err(|_| {
                AirtableError::Config(format!("{} must be a number of seconds", ENV_TIMEOUT_SECS))
            })?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }
}

/// Load the configuration: defaults, then the file, then the environment
///
/// `path` replaces the default file location when given.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    if let Ok(env_file) = dotenv::dotenv() {
        tracing::debug!(path = %env_file.display(), "loaded .env");
    }

    let mut config = match path {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "patFromEnv"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_ENDPOINT_URL, ""),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::new();
        config.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_key.as_deref(), Some("patFromEnv"));
        assert_eq!(config.timeout_secs, Some(15));
        assert_eq!(config.endpoint_url, "https://api.airtable.com");
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = ClientConfig::new();
        let result = config.apply_env(|k| (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string()));
        assert!(matches!(result, Err(AirtableError::Config(_))));
    }

    #[test]
    fn test_retry_config_to_strategy() {
        let retry = RetryConfig {
            total: 2,
            backoff_factor: 0.5,
            status_forcelist: vec![429, 503],
            max_backoff_secs: 10,
        };
        let strategy = retry.to_strategy();
        assert_eq!(strategy.total, 2);
        assert_eq!(strategy.status_forcelist, vec![429, 503]);
        assert_eq!(strategy.max_backoff, Duration::from_secs(10));
        assert!(strategy.respect_retry_after);
    }
}
