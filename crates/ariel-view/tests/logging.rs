//! Tests for logging initialization
//!
//! Only one global subscriber can be installed per process, so later calls
//! are expected to fail gracefully rather than panic.

use ariel_view::core::logging::{init_logging, LogFormat, LogSettings};
use std::str::FromStr;

#[test]
fn test_log_format_variants() {
    let variants = LogFormat::variants();
    assert!(variants.contains(&"compact"));
    assert!(variants.contains(&"pretty"));
    assert!(variants.contains(&"json"));
    for name in variants {
        assert_eq!(LogFormat::from_str(name).unwrap().as_str(), *name);
    }
}

#[test]
fn test_directive_filters_pass_through() {
    let settings = LogSettings::resolve(Some("ariel_view=trace,warn"), Some("json")).unwrap();
    assert_eq!(settings.filter, "ariel_view=trace,warn");
    assert_eq!(settings.format, LogFormat::Json);
}

#[test]
fn test_init_logging_repeatedly() {
    let _ = init_logging(Some("debug"), Some("compact"));
    let second = init_logging(Some("info"), Some("pretty"));
    assert!(second.is_err());
}

#[test]
fn test_init_logging_rejects_unknown_format() {
    assert!(init_logging(Some("info"), Some("xml")).is_err());
}
