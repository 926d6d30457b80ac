use crate::buffer::BatchConfig;
use crate::domain::LogLevel;
use crate::format::{DEFAULT_TEMPLATE, MetadataKeys};
use crate::router::ThrottleConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BUFFER_SIZE: usize = 8;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 8192;
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_THROTTLE_MAX_REPEATS: u32 = 3;
pub const DEFAULT_THROTTLE_MAX_ENTRIES: usize = 1024;
pub const DEFAULT_VERBOSE_PATH: &str = "/data/rask-log-shipper/verbose";
/// Filesystem noise emitted by the OS on every missing optional file.
pub const DEFAULT_EXCLUDE_PATTERN: &str = "No such file or directory";
pub const DEFAULT_IMMEDIATE_PATTERN: &str = "[health_check]";

/// Serializable tunables of the shipper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipperSettings {
    pub min_level: Option<LogLevel>,
    pub metadata_keys: MetadataKeys,
    pub format: String,
    pub buffer_size: usize,
    pub max_payload_bytes: usize,
    pub throttle_enabled: bool,
    #[serde(rename = "throttle_window_ms", with = "super::serde_helpers")]
    pub throttle_window: Duration,
    pub throttle_max_repeats: u32,
    pub throttle_max_entries: usize,
    pub verbose_path: PathBuf,
    pub exclude_patterns: Vec<String>,
    pub immediate_patterns: Vec<String>,
}

impl Default for ShipperSettings {
    fn default() -> Self {
        Self {
            min_level: None,
            metadata_keys: MetadataKeys::default(),
            format: DEFAULT_TEMPLATE.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            throttle_enabled: true,
            throttle_window: DEFAULT_THROTTLE_WINDOW,
            throttle_max_repeats: DEFAULT_THROTTLE_MAX_REPEATS,
            throttle_max_entries: DEFAULT_THROTTLE_MAX_ENTRIES,
            verbose_path: PathBuf::from(DEFAULT_VERBOSE_PATH),
            exclude_patterns: vec![DEFAULT_EXCLUDE_PATTERN.to_string()],
            immediate_patterns: vec![DEFAULT_IMMEDIATE_PATTERN.to_string()],
        }
    }
}

impl ShipperSettings {
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            max_lines: self.buffer_size,
            max_payload_bytes: self.max_payload_bytes,
        }
    }

    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig {
            enabled: self.throttle_enabled,
            window: self.throttle_window,
            max_repeats: self.throttle_max_repeats,
            max_entries: self.throttle_max_entries,
        }
    }
}
