//! Handler configuration.
//!
//! Built once at startup: TOML file (optional) → environment → CLI overrides.
//! Handlers receive the finished struct and never read the environment themselves.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CfpError, Result};

/// Port the host expects the handler to listen on.
pub const PORT_ENV: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";
/// Set to `0|false|off|no` to keep raw payloads out of the logs.
pub const VERBOSE_ENV: &str = "COSMOS_VERBOSE";
pub const VISUALIZER_ENDPOINT_ENV: &str = "VISUALIZER_ENDPOINT";
pub const VISUALIZER_ENABLED_ENV: &str = "VISUALIZER_ENABLED";
pub const VISUALIZER_TIMEOUT_ENV: &str = "VISUALIZER_TIMEOUT_SECS";

pub const DEFAULT_VISUALIZER_ENDPOINT: &str = "https://cosmosdb-changefeed-visualizer.wonderfulplant-6b5cf838.northeurope.azurecontainerapps.io/api/publishEvents";

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Must be known before the server starts, see [`HandlerConfig::listen_addr`].
    #[serde(default)]
    pub port: Option<u16>,
    /// Include full raw payload text in change-feed logs.
    #[serde(default = "bool_true")]
    pub verbose: bool,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
}

fn default_host() -> String { "0.0.0.0".into() }
fn bool_true() -> bool { true }

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            verbose: true,
            visualizer: VisualizerConfig::default(),
        }
    }
}

/// Visualization relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizerConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String { DEFAULT_VISUALIZER_ENDPOINT.into() }
fn default_timeout_secs() -> u64 { 5 }

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HandlerConfig {
    /// Load config from a TOML file. An unreadable file is an I/O error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CfpError::Config(format!("Failed to parse config: {e}")))
    }

    /// Overlay values from an environment lookup. Unset keys leave the field alone.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            let port = port.trim().parse::<u16>().map_err(|e| {
                CfpError::Config(format!("{PORT_ENV}={port:?} is not a valid port: {e}"))
            })?;
            self.port = Some(port);
        }
        if let Some(v) = lookup(VERBOSE_ENV) {
            self.verbose = !is_off_flag(&v);
        }
        if let Some(endpoint) = lookup(VISUALIZER_ENDPOINT_ENV) {
            let endpoint = endpoint.trim();
            if !endpoint.is_empty() {
                self.visualizer.endpoint = endpoint.to_string();
            }
        }
        if let Some(v) = lookup(VISUALIZER_ENABLED_ENV) {
            self.visualizer.enabled = !is_off_flag(&v);
        }
        if let Some(secs) = lookup(VISUALIZER_TIMEOUT_ENV) {
            self.visualizer.timeout_secs = secs.trim().parse::<u64>().map_err(|e| {
                CfpError::Config(format!("{VISUALIZER_TIMEOUT_ENV}={secs:?} is not a number: {e}"))
            })?;
        }
        Ok(())
    }

    /// `host:port` to bind. Fails when no port was configured anywhere.
    pub fn listen_addr(&self) -> Result<String> {
        let port = self
            .port
            .ok_or_else(|| CfpError::Config(format!("{PORT_ENV} is not set")))?;
        Ok(format!("{}:{}", self.host, port))
    }
}

/// `0`, `false`, `off`, `no` (trimmed, any case) switch a flag off.
pub fn is_off_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}
