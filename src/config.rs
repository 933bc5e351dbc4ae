//! Runtime configuration.
//!
//! Settings come from an optional YAML file (`--config`) with serde defaults
//! for every field, then CLI flags override individual values.
//!
//! ```yaml
//! user_agent: "ArticleHarvest/0.1"
//! request_timeout_secs: 20
//! navigation_timeout_secs: 45
//! browser:
//!   headless: true
//!   chrome_executable: /usr/bin/chromium
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

/// Default user agent for the primary HTTP client.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// User agent sent by the primary extractor.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout for the primary extractor.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Upper bound on navigation plus settle time in the rendering extractor.
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    #[serde(default)]
    pub browser: BrowserSettings,
}

/// Launch settings for the per-URL headless browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Explicit Chrome/Chromium binary; auto-detected when absent.
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Force `--no-sandbox`. When absent, decided by container detection.
    #[serde(default)]
    pub no_sandbox: Option<bool>,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_max_redirects() -> usize {
    8
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_headless() -> bool {
    true
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            max_redirects: default_max_redirects(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_executable: None,
            no_sandbox: None,
        }
    }
}

impl HarvestConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Apply CLI overrides on top of file values.
    pub fn with_overrides(mut self, chromium_path: Option<PathBuf>, headed: bool) -> Self {
        if let Some(path) = chromium_path {
            self.browser.chrome_executable = Some(path);
        }
        if headed {
            self.browser.headless = false;
        }
        self
    }
}

impl BrowserSettings {
    /// Whether Chrome must be started with `--no-sandbox`.
    pub fn sandbox_disabled(&self) -> bool {
        self.no_sandbox.unwrap_or_else(running_in_container)
    }
}

/// setuid sandboxing does not work inside Docker or Kubernetes pods.
fn running_in_container() -> bool {
    Path::new("/.dockerenv").exists()
        || std::env::var("container").is_ok()
        || std::env::var("KUBERNETES_SERVICE_HOST").is_ok()
}

/// Load a YAML config file; missing fields take their defaults.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<HarvestConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded configuration");
    Ok(config)
}

fn parse_config(contents: &str) -> Result<HarvestConfig, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}
