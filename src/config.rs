//! Configuration module for default periods and tool filtering
//!
//! Reads/writes configuration from ~/.config/sensor-dashboard/dashboard.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::sensors::{accelerometer, compass, connection};

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// List of disabled tool names (all others are enabled)
    pub disabled: Vec<String>,
    /// Compass period when a caller gives none
    pub compass_frequency_ms: u64,
    /// Accelerometer period when a caller gives none
    pub accelerometer_frequency_ms: u64,
    /// Connection poll interval when a caller gives none
    pub connection_interval_ms: u64,
    /// Start every monitor as soon as the server is up
    pub autostart: bool,
    /// Repaint interval of the `watch` screen
    pub refresh_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            compass_frequency_ms: compass::DEFAULT_FREQUENCY_MS,
            accelerometer_frequency_ms: accelerometer::DEFAULT_FREQUENCY_MS,
            connection_interval_ms: connection::DEFAULT_INTERVAL_MS,
            autostart: false,
            refresh_ms: 500,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sensor-dashboard").join("dashboard.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::error!("Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!("Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Check if a tool is enabled
    pub fn is_enabled(&self, tool_name: &str) -> bool {
        !self.disabled.iter().any(|t| t == tool_name)
    }
}

/// Get list of all available tool names
pub fn all_tool_names() -> Vec<&'static str> {
    vec![
        "init_compass",
        "init_acc",
        "init_geo",
        "init_check_connection",
        "init_device",
        "get_display",
    ]
}
