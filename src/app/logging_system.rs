use super::config::{LogFormat, TracingLevel};
use parking_lot::RwLock;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    #[error("Invalid directive format '{input}'. Expected: 'target=level'")]
    InvalidDirectiveFormat { input: String },
    #[error("Empty target in directive '{input}'")]
    EmptyTarget { input: String },
    #[error("Invalid level in directive '{input}'")]
    InvalidLevel { input: String },
    #[error("Logging system initialization failed: {0}")]
    InitFailed(String),
}

/// A single `target=level` filter directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirective {
    target: String,
    level: Level,
}

impl LogDirective {
    pub fn new(target: impl Into<String>, level: Level) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }

    pub fn parse(input: &str) -> Result<Self, LoggingError> {
        let (target, level) =
            input
                .split_once('=')
                .ok_or_else(|| LoggingError::InvalidDirectiveFormat {
                    input: input.to_string(),
                })?;
        let target = target.trim();
        if target.is_empty() {
            return Err(LoggingError::EmptyTarget {
                input: input.to_string(),
            });
        }
        let level = Level::from_str(level.trim()).map_err(|_| LoggingError::InvalidLevel {
            input: input.to_string(),
        })?;
        Ok(Self::new(target, level))
    }

    pub fn to_filter_string(&self) -> String {
        format!(
            "{}={}",
            self.target,
            self.level.as_str().to_ascii_lowercase()
        )
    }
}

/// Collects filter directives and installs the global subscriber.
pub struct LoggingSystem {
    directives: Arc<RwLock<Vec<LogDirective>>>,
    /// A bare level such as `RUST_LOG=debug`; replaces the default level.
    default_override: Arc<RwLock<Option<LevelFilter>>>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: Arc::new(RwLock::new(Vec::new())),
            default_override: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a `target=level` directive, or a bare level that becomes the
    /// default for every target.
    pub fn add_directive(&self, directive_str: &str) -> Result<(), LoggingError> {
        if !directive_str.contains('=')
            && let Ok(level) = LevelFilter::from_str(directive_str.trim())
        {
            *self.default_override.write() = Some(level);
            return Ok(());
        }
        let directive = LogDirective::parse(directive_str)?;
        self.directives.write().push(directive);
        Ok(())
    }

    /// Directives from a comma separated list such as `RUST_LOG`. Bad
    /// entries are skipped with a note on stderr, since the subscriber is
    /// not up yet.
    pub fn add_directives_from(&self, list: &str) {
        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Err(e) = self.add_directive(part) {
                eprintln!("Warning: {e}, skipping directive");
            }
        }
    }

    pub fn build_filter_string(&self, default_level: TracingLevel) -> String {
        let directives = self.directives.read();
        let default = match *self.default_override.read() {
            Some(level) => level.to_string().to_ascii_lowercase(),
            None => Level::from(default_level).as_str().to_ascii_lowercase(),
        };

        if directives.is_empty() {
            return default;
        }

        let mut filter_parts = Vec::with_capacity(directives.len() + 1);
        filter_parts.push(default);
        filter_parts.extend(directives.iter().map(LogDirective::to_filter_string));
        filter_parts.join(",")
    }

    pub fn initialize_tracing(
        &self,
        default_level: TracingLevel,
        format: LogFormat,
    ) -> Result<(), LoggingError> {
        let filter_string = self.build_filter_string(default_level);
        let env_filter = EnvFilter::try_new(&filter_string).map_err(|e| {
            LoggingError::InitFailed(format!("bad filter '{filter_string}': {e}"))
        })?;

        // Diagnostics go to stderr; stdout carries shipped payloads.
        let result = match format {
            LogFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true)
                        .compact(),
                )
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .json()
                        .with_current_span(false)
                        .flatten_event(true),
                )
                .try_init(),
        };

        result.map_err(|e| LoggingError::InitFailed(e.to_string()))
    }

    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }

    pub fn default_override(&self) -> Option<LevelFilter> {
        *self.default_override.read()
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global subscriber once. Later calls return the first outcome.
pub fn setup_logging(level: TracingLevel, format: LogFormat) -> Result<(), LoggingError> {
    static INIT: OnceLock<Result<(), LoggingError>> = OnceLock::new();

    INIT.get_or_init(|| {
        let logging_system = LoggingSystem::new();
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            logging_system.add_directives_from(&rust_log);
        }
        logging_system.initialize_tracing(level, format)
    })
    .clone()
}
