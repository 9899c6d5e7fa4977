//! Configuration loading and API base URL resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and compiled
//! defaults are used. A TOML file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "VLIB_API_URL";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "VLIB_CONFIG";

/// Compiled default API base URL
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";

/// Bootstrap configuration loaded from TOML file
///
/// Every section is optional; missing keys take compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Base URL of the REST API (e.g. `http://127.0.0.1:8000/api/v1`)
    #[serde(default)]
    pub api_base_url: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub filters: FilterConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Total request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Response cache staleness bound in seconds (0 disables caching)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Attempts per request including the first one
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Backoff before the first retry in milliseconds; doubles per attempt
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound on a single backoff in milliseconds
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Overrides the User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Typeahead search settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Quiet period before a keystroke becomes a request
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of matches requested and shown
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Whether failed searches offer a manual retry
    #[serde(default)]
    pub manual_retry: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            page_size: default_page_size(),
            manual_retry: false,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Filter selection limits
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Maximum values per multi-valued filter key
    #[serde(default = "default_max_per_kind")]
    pub max_per_kind: usize,

    /// Maximum value filters across all keys
    #[serde(default = "default_max_total")]
    pub max_total: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_per_kind: default_max_per_kind(),
            max_total: default_max_total(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_page_size() -> usize {
    10
}

fn default_max_per_kind() -> usize {
    10
}

fn default_max_total() -> usize {
    20
}

/// Standard User-Agent for HTTP clients, `package/version` of the calling crate
pub fn get_user_agent(package: &str, version: &str) -> String {
    format!("{}/{}", package, version)
}

/// Platform config file location (`<config_dir>/vlib/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vlib").join("config.toml"))
}

/// Resolve the config file path
///
/// Priority: CLI argument > `VLIB_CONFIG` > platform default.
/// Returns `None` only when no platform config directory exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Load TOML configuration, degrading to defaults when the file is missing
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Write TOML configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    debug!("Wrote TOML configuration to {}", path.display());
    Ok(())
}

/// Resolve the API base URL
///
/// Priority: CLI argument > `VLIB_API_URL` > TOML `api_base_url` > compiled default.
/// Trailing slashes are trimmed so paths can be appended directly.
pub fn resolve_api_base_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_value = std::env::var(API_URL_ENV).ok();

    let (url, source) = if let Some(url) = cli_arg.filter(|u| !u.trim().is_empty()) {
        (url.to_string(), "command line")
    } else if let Some(url) = env_value.filter(|u| !u.trim().is_empty()) {
        (url, "environment")
    } else if let Some(url) = toml_config
        .api_base_url
        .as_ref()
        .filter(|u| !u.trim().is_empty())
    {
        (url.clone(), "TOML")
    } else {
        (DEFAULT_API_BASE_URL.to_string(), "compiled default")
    };

    let url = url.trim().trim_end_matches('/').to_string();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API base URL must start with http:// or https:// (got '{}' from {})",
            url, source
        )));
    }

    debug!("API base URL: {} (from {})", url, source);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.client.timeout(), Duration::from_secs(15));
        assert_eq!(config.search.debounce(), Duration::from_millis(300));
        assert_eq!(config.search.page_size, 10);
        assert!(!config.search.manual_retry);
        assert_eq!(config.filters.max_per_kind, 10);
        assert_eq!(config.filters.max_total, 20);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            api_base_url = "http://videos.local/api/v1"

            [search]
            debounce_ms = 150
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_url.as_deref(), Some("http://videos.local/api/v1"));
        assert_eq!(config.search.debounce_ms, 150);
        assert_eq!(config.search.page_size, 10);
        assert_eq!(config.client.cache_ttl_secs, 300);
    }

    #[test]
    fn test_user_agent_has_version() {
        assert_eq!(get_user_agent("vlib-ui", "1.2.3"), "vlib-ui/1.2.3");
    }

    #[test]
    fn test_cli_url_wins_and_is_trimmed() {
        let config = TomlConfig {
            api_base_url: Some("http://toml.local/api".to_string()),
            ..Default::default()
        };
        let url = resolve_api_base_url(Some("http://cli.local/api/"), &config).unwrap();
        assert_eq!(url, "http://cli.local/api");
    }

    #[test]
    fn test_cli_config_path_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(path, Some(PathBuf::from("/tmp/custom.toml")));
    }
}
