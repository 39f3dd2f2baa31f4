//! Tracing setup for the binary
//!
//! Library code only emits `tracing` events with per-module targets such as
//! `pipeline`, `meta::client` or `genai::openai`. The binary installs a
//! subscriber that writes to stderr, so stdout carries only the JSON result.

use crate::error::{InsightsError, InsightsResult};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Default verbosity when `RUST_LOG` is not set
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Filter from `RUST_LOG`, falling back to `level`
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global stderr subscriber
pub fn init(level: LogLevel) -> InsightsResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| InsightsError::ConfigError(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert!(LogLevel::Debug < LogLevel::Error);
    }

    #[test]
    fn test_level_parses_from_cli_value() {
        assert_eq!(LogLevel::from_str("debug", true).unwrap(), LogLevel::Debug);
        assert!(LogLevel::from_str("verbose", true).is_err());
    }

    #[test]
    fn test_scoped_subscriber_with_filter() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(LogLevel::Warn.as_str()))
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(tracing::Level::WARN));
            assert!(!tracing::enabled!(tracing::Level::INFO));
        });
    }
}
