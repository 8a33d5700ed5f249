use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin of the problem archive, also used to resolve relative links.
    pub archive_origin: String,
    /// Origin of the difficulty metadata service.
    pub metadata_origin: String,
    /// Relay endpoint (`.../proxy`). Requests go direct when unset.
    pub relay_url: Option<String>,
    pub user_agent: String,
    pub failure_delay_ms: u64,
    pub debounce_ms: u64,
    pub search_limit: usize,
    pub request_timeout_secs: u64,
    pub notebook_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_origin: "https://www.acmicpc.net".into(),
            metadata_origin: "https://solved.ac".into(),
            relay_url: None,
            user_agent: DEFAULT_USER_AGENT.into(),
            failure_delay_ms: 2000,
            debounce_ms: 300,
            search_limit: 5,
            request_timeout_secs: 30,
            notebook_file: "BOJ_Problems.ipynb".into(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn archive_origin(&self) -> Result<Url> {
        Ok(Url::parse(&self.archive_origin)?)
    }

    pub fn metadata_origin(&self) -> Result<Url> {
        Ok(Url::parse(&self.metadata_origin)?)
    }

    pub fn relay_url(&self) -> Result<Option<Url>> {
        Ok(self.relay_url.as_deref().map(Url::parse).transpose()?)
    }

    pub fn failure_delay(&self) -> Duration {
        Duration::from_millis(self.failure_delay_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_should_keep_defaults() {
        let config = Config::from_toml(
            r#"
            relay_url = "https://relay.example.com/api/proxy"
            failure_delay_ms = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.failure_delay(), Duration::from_millis(10));
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.archive_origin, "https://www.acmicpc.net");
        assert_eq!(
            config.relay_url().unwrap().unwrap().as_str(),
            "https://relay.example.com/api/proxy"
        );
    }

    #[test]
    fn bad_toml_should_be_config_error() {
        let err = Config::from_toml("failure_delay_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
