//! Configuration management
//!
//! Settings are read with the following priority:
//! 1. Environment variables
//! 2. `ambiorix.toml` in the working directory
//! 3. Defaults
//!
//! `${VAR_NAME}` inside the TOML file is replaced by the environment value.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::endpoint::{PageLocation, SchemePolicy, endpoint_url};
use crate::error::{BusError, Result};

/// Default config file name
pub const CONFIG_FILE: &str = "ambiorix.toml";

/// Connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    /// URL of the page the bus belongs to; the socket host is taken from it
    #[serde(default = "default_page_url")]
    pub page_url: String,

    #[serde(default)]
    pub scheme_policy: SchemePolicy,

    /// How long the client waits for the socket to open
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            page_url: default_page_url(),
            scheme_policy: SchemePolicy::default(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ConnectionConfig {
    pub fn page(&self) -> Result<PageLocation> {
        PageLocation::parse(&self.page_url)
    }

    /// Socket URL derived from the page URL and scheme policy
    pub fn endpoint(&self) -> Result<Url> {
        endpoint_url(&self.page()?, self.scheme_policy)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Command-line client settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Message names to print in listen mode
    #[serde(default)]
    pub listen: Vec<String>,
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

fn default_page_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl Config {
    /// Replace `${VAR_NAME}` with the value returned by `lookup`
    ///
    /// Unknown variables expand to an empty string.
    fn expand_vars(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Some(env_value) = lookup(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Parse TOML text, expanding variables through `lookup`
    fn parse_toml(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let expanded = Self::expand_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Load configuration from a TOML file
    ///
    /// Environment variables override values from the file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BusError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::parse_toml(&content, env_lookup)?;
        cfg.apply_overrides(env_lookup)?;
        Ok(cfg)
    }

    /// Load from `ambiorix.toml` if present, otherwise from the environment
    pub fn load() -> Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }
        Self::from_env()
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_overrides(env_lookup)?;
        Ok(cfg)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("AMBIORIX_PAGE_URL").filter(|v| !v.is_empty()) {
            self.connection.page_url = url;
        }

        if let Some(policy) = lookup("AMBIORIX_SCHEME_POLICY").filter(|v| !v.is_empty()) {
            self.connection.scheme_policy = policy.parse()?;
        }

        if let Some(timeout) = lookup("AMBIORIX_CONNECT_TIMEOUT") {
            self.connection.connect_timeout_secs = timeout.trim().parse().map_err(|_| {
                BusError::Config(format!("Invalid AMBIORIX_CONNECT_TIMEOUT: {}", timeout))
            })?;
        }

        if let Some(names) = lookup("AMBIORIX_LISTEN") {
            self.client.listen = names
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(())
    }
}
