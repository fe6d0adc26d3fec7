//! Integration tests for logging configuration and redaction

use bridge_traits::logging::LogLevel;
use core_runtime::logging::{redact_if_sensitive, LogFormat, LoggingConfig};

#[test]
fn test_logging_config_for_platform_collector() {
    // Only one global subscriber per process, so the builder is what we check
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.enable_spans);
    assert!(config.logger_sink.is_none());
}

#[test]
fn test_token_fields_are_redacted() {
    assert_eq!(redact_if_sensitive("access_token", "ya29.a0Af"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("refresh_token", "1//0g"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "anything"), "[REDACTED]");
}

#[test]
fn test_identifiers_pass_through() {
    assert_eq!(redact_if_sensitive("secret_id", "5f1d0c"), "5f1d0c");
    assert_eq!(redact_if_sensitive("spreadsheet_id", "1Bxi"), "1Bxi");
    assert_eq!(redact_if_sensitive("last_emitted_line", "11"), "11");
}
