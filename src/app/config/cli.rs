use super::overrides::ConfigOverrides;
use super::{ConfigError, LogFormat, TracingLevel};
use crate::domain::LogLevel;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command line of the `rask-log-shipper` binary.
///
/// Flags layer on top of the config file and `SHIPPER_*` variables; only
/// flags that are actually passed override anything.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, env = "SHIPPER_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Lines per batch before a flush
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Maximum bytes per combined payload
    #[arg(long)]
    pub max_payload_bytes: Option<usize>,

    /// Disable repeat throttling
    #[arg(long)]
    pub no_throttle: bool,

    /// Throttle window in milliseconds
    #[arg(long)]
    pub throttle_window_ms: Option<u64>,

    /// Identical lines allowed per window
    #[arg(long)]
    pub throttle_max_repeats: Option<u32>,

    /// Minimum level of shipped events
    #[arg(long)]
    pub min_level: Option<LogLevel>,

    /// File holding the persisted verbose flag
    #[arg(long)]
    pub verbose_path: Option<PathBuf>,

    /// Render template for shipped lines
    #[arg(long)]
    pub format: Option<String>,

    /// Level of the shipper's own diagnostics
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: TracingLevel,

    /// Format of the shipper's own diagnostics
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Cli::try_parse_from(args).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            min_level: self.min_level.map(Some),
            format: self.format.clone(),
            buffer_size: self.buffer_size,
            max_payload_bytes: self.max_payload_bytes,
            throttle_enabled: self.no_throttle.then_some(false),
            throttle_window: self.throttle_window_ms.map(Duration::from_millis),
            throttle_max_repeats: self.throttle_max_repeats,
            verbose_path: self.verbose_path.clone(),
            ..ConfigOverrides::default()
        }
    }

    /// File, then environment, then flags.
    pub fn resolve_overrides(&self) -> Result<ConfigOverrides, ConfigError> {
        let file = match &self.config_file {
            Some(path) => ConfigOverrides::from_file(path)?,
            None => ConfigOverrides::default(),
        };
        Ok(file.layer(ConfigOverrides::from_env()).layer(self.overrides()))
    }
}
