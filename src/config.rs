//! Top-level application configuration.
//!
//! Configuration is stored in `.dealboard/config.yaml` (or under
//! `$DEALBOARD_ROOT`) and includes:
//! - Pipeline API location, token and timeout
//! - Board pagination and capacity settings
//! - Search debounce

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DealboardError, Result};

pub const ROOT_DIR: &str = ".dealboard";

/// Environment variable overriding the configuration directory
pub const ROOT_ENV: &str = "DEALBOARD_ROOT";
/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "DEALBOARD_API_URL";
/// Environment variable overriding `api.token`
pub const API_TOKEN_ENV: &str = "DEALBOARD_API_TOKEN";

/// Keys accepted by `config get` / `config set`
pub const CONFIG_KEYS: &[&str] = &[
    "api.base_url",
    "api.token",
    "api.timeout",
    "board.page_size",
    "board.max_deals_per_stage",
    "board.scroll_threshold",
    "search.debounce_ms",
    "default_workspace",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default, skip_serializing_if = "BoardConfig::is_default")]
    pub board: BoardConfig,

    #[serde(default, skip_serializing_if = "SearchConfig::is_default")]
    pub search: SearchConfig,

    /// Workspace used when a command does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workspace: Option<String>,
}

/// Pipeline API connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Board behaviour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Deals requested per column page (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Reject drops onto stages holding this many deals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_deals_per_stage: Option<usize>,

    /// Visible fraction of the last card that counts as "seen" (default: 0.5)
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: f32,
}

fn default_page_size() -> usize {
    10
}

fn default_scroll_threshold() -> f32 {
    0.5
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_deals_per_stage: None,
            scroll_threshold: default_scroll_threshold(),
        }
    }
}

impl BoardConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Free-text search settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before a search is applied (default: 300ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SearchConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Directory holding the configuration file
pub fn dealboard_root() -> PathBuf {
    match env::var(ROOT_ENV) {
        Ok(root) if !root.is_empty() => PathBuf::from(root),
        _ => PathBuf::from(ROOT_DIR),
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        dealboard_root().join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            DealboardError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DealboardError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            DealboardError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // Owner read/write only, the file may hold an API token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.board.page_size == 0 {
            return Err(DealboardError::Config(
                "board.page_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.board.scroll_threshold) {
            return Err(DealboardError::Config(
                "board.scroll_threshold must be between 0 and 1".to_string(),
            ));
        }
        if let Some(base_url) = &self.api.base_url {
            parse_base_url(base_url)?;
        }
        Ok(())
    }

    /// API base URL from the environment or the config file
    pub fn api_base_url(&self) -> Result<Url> {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.is_empty()
        {
            return parse_base_url(&url);
        }

        match &self.api.base_url {
            Some(url) => parse_base_url(url),
            None => Err(DealboardError::Config(format!(
                "api.base_url is not configured. Set it with `dealboard config set api.base_url <url>` or {API_URL_ENV}"
            ))),
        }
    }

    /// API token from the environment or the config file
    pub fn api_token(&self) -> Option<SecretString> {
        if let Ok(token) = env::var(API_TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(SecretString::from(token));
        }

        self.api.token.clone().map(SecretString::from)
    }

    /// Read a config value for display. Tokens are masked.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "api.base_url" => self.api.base_url.clone(),
            "api.token" => self.api.token.as_ref().map(|t| mask_token(t)),
            "api.timeout" => Some(self.api.timeout.to_string()),
            "board.page_size" => Some(self.board.page_size.to_string()),
            "board.max_deals_per_stage" => self.board.max_deals_per_stage.map(|n| n.to_string()),
            "board.scroll_threshold" => Some(self.board.scroll_threshold.to_string()),
            "search.debounce_ms" => Some(self.search.debounce_ms.to_string()),
            "default_workspace" => self.default_workspace.clone(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a config value from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.base_url" => {
                parse_base_url(value)?;
                self.api.base_url = Some(value.to_string());
            }
            "api.token" => self.api.token = Some(value.to_string()),
            "api.timeout" => self.api.timeout = parse_number(key, value)?,
            "board.page_size" => {
                let size: usize = parse_number(key, value)?;
                if size == 0 {
                    return Err(DealboardError::Config(
                        "board.page_size must be at least 1".to_string(),
                    ));
                }
                self.board.page_size = size;
            }
            "board.max_deals_per_stage" => {
                self.board.max_deals_per_stage = if value == "none" {
                    None
                } else {
                    Some(parse_number(key, value)?)
                };
            }
            "board.scroll_threshold" => {
                let threshold: f32 = parse_number(key, value)?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(DealboardError::Config(
                        "board.scroll_threshold must be between 0 and 1".to_string(),
                    ));
                }
                self.board.scroll_threshold = threshold;
            }
            "search.debounce_ms" => self.search.debounce_ms = parse_number(key, value)?,
            "default_workspace" => self.default_workspace = Some(value.to_string()),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn parse_base_url(value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| DealboardError::Config(format!("invalid api.base_url '{value}': {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(DealboardError::Config(format!(
            "invalid api.base_url '{value}': expected an http(s) URL"
        )));
    }
    Ok(url)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DealboardError::Config(format!("invalid value '{value}' for {key}")))
}

fn unknown_key(key: &str) -> DealboardError {
    DealboardError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    ))
}

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if token.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("****{visible}")
    }
}
