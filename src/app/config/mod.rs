mod cli;
pub mod overrides;
pub mod serde_helpers;
pub mod settings;
pub mod state;
mod validation;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("File error: {0}")]
    FileError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::FileError(e.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::ParseError(e.to_string())
    }
}

/// Verbosity of the shipper's own diagnostics. Distinct from
/// [`crate::domain::LogLevel`], which classifies the events being shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TracingLevel> for tracing::Level {
    fn from(level: TracingLevel) -> Self {
        match level {
            TracingLevel::Error => tracing::Level::ERROR,
            TracingLevel::Warn => tracing::Level::WARN,
            TracingLevel::Info => tracing::Level::INFO,
            TracingLevel::Debug => tracing::Level::DEBUG,
            TracingLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Output format of the shipper's own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable lines (default)
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

pub use cli::Cli;
pub use overrides::{ConfigOverrides, MetadataPredicate};
pub use settings::ShipperSettings;
pub use state::ConfigState;
