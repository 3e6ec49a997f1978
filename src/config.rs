//! Configuration file support.
//!
//! Settings are read from TOML, by default `<config dir>/fichas/config.toml`.
//! Every key is optional; command-line flags override whatever the file says.

use crate::error::{FichasError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub print: PrintConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployed web-app URL of the spreadsheet gateway
    pub base_url: String,
    /// Ask the gateway to wrap replies in a named callback
    pub callback_mode: bool,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            callback_mode: false,
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    pub fn parsed_base_url(&self) -> Result<Url> {
        if self.base_url.trim().is_empty() {
            return Err(FichasError::config(
                "no gateway URL configured (set gateway.base_url or pass --base-url)",
            ));
        }
        Url::parse(self.base_url.trim()).map_err(|e| {
            FichasError::config(format!("invalid gateway URL '{}': {}", self.base_url, e))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Records per batch document
    pub group_size: usize,
    /// Delay between consecutive batch documents
    pub group_interval_ms: u64,
    /// Wait after opening a batch document before printing it
    pub print_grace_ms: u64,
    /// Command used to open documents; the URL is appended as last argument
    pub open_command: Option<Vec<String>>,
    /// Command used to print an opened document; the URL is appended as last argument
    pub print_command: Option<Vec<String>>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            group_size: 10,
            group_interval_ms: 2000,
            print_grace_ms: 1000,
            open_command: None,
            print_command: None,
        }
    }
}

impl PrintConfig {
    pub fn group_interval(&self) -> Duration {
        Duration::from_millis(self.group_interval_ms)
    }

    pub fn print_grace(&self) -> Duration {
        Duration::from_millis(self.print_grace_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Terminal input polling interval
    pub poll_interval_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
        }
    }
}

impl UiConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Default location of the configuration file, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fichas").join("config.toml"))
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| FichasError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// A missing file is an error unless `allow_missing` is set, in which case
    /// defaults are returned.
    pub fn load(path: &Path, allow_missing: bool) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text).map_err(|e| match e {
                FichasError::ConfigError { message } => {
                    FichasError::config(format!("{}: {}", path.display(), message))
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
                Ok(Self::default())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FichasError::config(
                format!("config file not found '{}'", path.display()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Load from `path` when given, otherwise from the default location if present.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path, false),
            None => match default_config_path() {
                Some(path) => Self::load(&path, true),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.print.group_size == 0 {
            return Err(FichasError::config("print.group_size must be at least 1"));
        }
        for (name, command) in [
            ("print.open_command", &self.print.open_command),
            ("print.print_command", &self.print.print_command),
        ] {
            if matches!(command, Some(parts) if parts.is_empty()) {
                return Err(FichasError::config(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}
