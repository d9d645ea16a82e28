//! Infrastructure layer constants
//!
//! Domain-specific constants are defined in `dcr_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "dcr.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "dcr";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "DCR";

/// Separator between nested keys in environment variables
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Environment variable overriding the configured log filter
pub const LOG_ENV_VAR: &str = "DCR_LOG";

/// File name prefix of the daily rolling log file
pub const LOG_FILE_PREFIX: &str = "dcr.log";
