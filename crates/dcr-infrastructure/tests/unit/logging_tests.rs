//! Logging Tests

use dcr_infrastructure::constants::DEFAULT_LOG_LEVEL;
use dcr_infrastructure::logging::{parse_log_level, LoggingConfig};
use tracing::Level;

#[test]
fn test_parse_log_level() {
    assert_eq!(parse_log_level("trace").expect("level should parse"), Level::TRACE);
    assert_eq!(parse_log_level("debug").expect("level should parse"), Level::DEBUG);
    assert_eq!(parse_log_level("INFO").expect("level should parse"), Level::INFO);
    assert_eq!(parse_log_level("warn").expect("level should parse"), Level::WARN);
    assert_eq!(parse_log_level("Warning").expect("level should parse"), Level::WARN);
    assert_eq!(parse_log_level(" error ").expect("level should parse"), Level::ERROR);

    let invalid = parse_log_level("verbose");
    assert!(invalid.is_err_and(|e| e.is_configuration() && e.to_string().contains("verbose")));
}

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, DEFAULT_LOG_LEVEL);
    assert!(!config.json_format);
    assert!(config.file_output.is_none());
}
