//! Application configuration.
//!
//! Stored in `.backoffice/config.yaml` (or the file named by
//! `BACKOFFICE_CONFIG`) and covers:
//! - Backend base URL
//! - Request timeout
//! - Default page size and bulk concurrency
//! - How long notices stay on screen

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BackofficeError, Result};

pub const CONFIG_ENV: &str = "BACKOFFICE_CONFIG";
pub const API_URL_ENV: &str = "BACKOFFICE_API_URL";

const CONFIG_DIR: &str = ".backoffice";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL, e.g. `https://api.example.com/admin/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Rows per page (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Bulk requests in flight at once (default: 1, sequential)
    #[serde(default = "default_bulk_concurrency")]
    pub bulk_concurrency: usize,

    /// Seconds before a notice auto-dismisses (default: 5)
    #[serde(default = "default_notice_ttl")]
    pub notice_ttl: u64,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    crate::collection::DEFAULT_PAGE_SIZE
}

fn default_bulk_concurrency() -> usize {
    1
}

fn default_notice_ttl() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout: default_request_timeout(),
            page_size: default_page_size(),
            bulk_concurrency: default_bulk_concurrency(),
            notice_ttl: default_notice_ttl(),
        }
    }
}

impl Config {
    /// Path of the config file: `$BACKOFFICE_CONFIG` if set, otherwise
    /// `.backoffice/config.yaml` under the working directory.
    pub fn config_path() -> PathBuf {
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => Path::new(CONFIG_DIR).join("config.yaml"),
        }
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            BackofficeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Backend URL from the environment or the config file
    pub fn api_url(&self) -> Option<String> {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            return Some(url);
        }

        self.api_url.clone()
    }

    /// Parsed backend URL. Errors when none is configured.
    pub fn require_api_url(&self) -> Result<Url> {
        let raw = self.api_url().ok_or_else(|| {
            BackofficeError::Config(format!(
                "no backend URL configured. Set {API_URL_ENV} or api_url in {}",
                Self::config_path().display()
            ))
        })?;
        parse_api_url(&raw)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl)
    }

    /// Reject values the controller cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(BackofficeError::Config(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.bulk_concurrency == 0 {
            return Err(BackofficeError::Config(
                "bulk_concurrency must be at least 1".to_string(),
            ));
        }
        if let Some(raw) = &self.api_url {
            parse_api_url(raw)?;
        }
        Ok(())
    }
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| BackofficeError::Config(format!("invalid api_url '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(BackofficeError::Config(format!(
            "invalid api_url '{raw}': not a base URL"
        )));
    }
    Ok(url)
}
