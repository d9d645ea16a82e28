//! Configuration types

use std::path::PathBuf;

use dcr_application::RuntimeSettings;
use dcr_providers::ScopePolicy;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOG_LEVEL;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging
    pub logging: LoggingConfig,
    /// Engine defaults handed to every factory
    pub runtime: RuntimeSettings,
    /// Service registry layout
    pub registry: RegistryConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON output format
    pub json_format: bool,

    /// Log to a daily rolling file in addition to stdout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Which of the local and global registries component instances see
    pub scope: ScopePolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            scope: ScopePolicy::LocalAndGlobal,
        }
    }
}
