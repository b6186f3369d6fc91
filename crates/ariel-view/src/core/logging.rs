//! Logging setup for editor sessions and the CLI
//!
//! Structured logging goes through `tracing`. Native builds install a
//! `tracing-subscriber` registry with an `EnvFilter` and one of three
//! formatters; browser builds forward events to the console through
//! `tracing-wasm`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ariel_view::core::logging::init_logging;
//!
//! // Level and format from the environment, or info/compact
//! init_logging(None, None).ok();
//!
//! // Explicit settings
//! init_logging(Some("debug"), Some("pretty")).ok();
//! ```
//!
//! # Environment Variables
//!
//! - `ARIEL_VIEW_LOG_LEVEL`: trace|debug|info|warn|error|off
//! - `RUST_LOG`: standard `EnvFilter` directives, e.g.
//!   `info,ariel_view::core::viewport=trace`
//! - `ARIEL_VIEW_LOG_FORMAT`: compact|pretty|json
//!
//! Render spans carry the engine name, render id, and input length; viewport
//! events are emitted at `trace`.

use std::str::FromStr;

#[cfg(not(target_arch = "wasm32"))]
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

#[cfg(target_arch = "wasm32")]
use tracing_wasm::WASMLayerConfigBuilder;

/// Environment variable holding the log level
pub const LOG_LEVEL_ENV: &str = "ARIEL_VIEW_LOG_LEVEL";

/// Environment variable holding the log format
pub const LOG_FORMAT_ENV: &str = "ARIEL_VIEW_LOG_FORMAT";

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single line per event
    #[default]
    Compact,
    /// Multi-line with source locations
    Pretty,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Get all valid format names
    pub fn variants() -> &'static [&'static str] {
        &["compact", "pretty", "json"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Resolved logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` directives, or `off`
    pub filter: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// Merge explicit values with the environment.
    ///
    /// Explicit arguments win over `ARIEL_VIEW_LOG_LEVEL` / `RUST_LOG` and
    /// `ARIEL_VIEW_LOG_FORMAT`.
    pub fn resolve(level: Option<&str>, format: Option<&str>) -> Result<Self, String> {
        let filter = level
            .map(str::to_string)
            .or_else(|| std::env::var(LOG_LEVEL_ENV).ok())
            .or_else(|| std::env::var("RUST_LOG").ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        let format = match format
            .map(str::to_string)
            .or_else(|| std::env::var(LOG_FORMAT_ENV).ok())
        {
            Some(name) => name.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self { filter, format })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// * `level` - trace|debug|info|warn|error|off or any `EnvFilter`
///   directive list. Falls back to `ARIEL_VIEW_LOG_LEVEL`, then `RUST_LOG`,
///   then `info`.
/// * `format` - compact|pretty|json. Falls back to `ARIEL_VIEW_LOG_FORMAT`,
///   then `compact`.
///
/// Fails when the format is unknown or a global subscriber is already set.
pub fn init_logging(
    level: Option<&str>,
    format: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = LogSettings::resolve(level, format)?;

    #[cfg(target_arch = "wasm32")]
    {
        let max_level = settings
            .filter
            .parse::<tracing::Level>()
            .unwrap_or(tracing::Level::INFO);
        tracing_wasm::set_as_global_default_with_config(
            WASMLayerConfigBuilder::new()
                .set_max_level(max_level)
                .build(),
        );
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let registry = Registry::default().with(env_filter(&settings.filter));
        match settings.format {
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_target(false))
                .try_init()?,
            LogFormat::Pretty => registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_file(true)
                        .with_line_number(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .try_init()?,
            LogFormat::Json => registry
                .with(fmt::layer().json().with_current_span(true))
                .try_init()?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
        assert_eq!(LogFormat::from_str(" JSON ").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("xml").is_err());
    }

    #[test]
    fn test_explicit_settings_win() {
        let settings = LogSettings::resolve(Some("debug"), Some("pretty")).unwrap();
        assert_eq!(settings.filter, "debug");
        assert_eq!(settings.format, LogFormat::Pretty);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(LogSettings::resolve(Some("info"), Some("yaml")).is_err());
    }
}
