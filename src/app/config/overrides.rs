use super::ConfigError;
use super::serde_helpers::{load_env_list, load_env_path, load_env_var, split_list};
use super::settings::ShipperSettings;
use crate::domain::{LogEvent, LogLevel};
use crate::format::MetadataKeys;
use crate::sink::SharedSink;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Host-supplied metadata filter, evaluated against the raw event.
pub type MetadataPredicate = Arc<dyn Fn(&LogEvent) -> bool + Send + Sync>;

/// A partial configuration. Only fields that are set replace the current
/// value when merged into a [`super::ConfigState`].
///
/// Runtime handles (sink and metadata predicates) use a nested `Option`:
/// `Some(None)` clears the handle, `None` leaves it alone.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    pub min_level: Option<Option<LogLevel>>,
    pub metadata_keys: Option<MetadataKeys>,
    pub format: Option<String>,
    pub buffer_size: Option<usize>,
    pub max_payload_bytes: Option<usize>,
    pub throttle_enabled: Option<bool>,
    pub throttle_window: Option<Duration>,
    pub throttle_max_repeats: Option<u32>,
    pub throttle_max_entries: Option<usize>,
    pub verbose_path: Option<PathBuf>,
    pub exclude_patterns: Option<Vec<String>>,
    pub immediate_patterns: Option<Vec<String>>,
    pub sink: Option<Option<SharedSink>>,
    pub metadata_include: Option<Option<MetadataPredicate>>,
    pub metadata_exclude: Option<Option<MetadataPredicate>>,
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("min_level", &self.min_level)
            .field("metadata_keys", &self.metadata_keys)
            .field("format", &self.format)
            .field("buffer_size", &self.buffer_size)
            .field("max_payload_bytes", &self.max_payload_bytes)
            .field("throttle_enabled", &self.throttle_enabled)
            .field("throttle_window", &self.throttle_window)
            .field("throttle_max_repeats", &self.throttle_max_repeats)
            .field("throttle_max_entries", &self.throttle_max_entries)
            .field("verbose_path", &self.verbose_path)
            .field("exclude_patterns", &self.exclude_patterns)
            .field("immediate_patterns", &self.immediate_patterns)
            .field("sink", &self.sink.as_ref().map(|s| s.is_some()))
            .field(
                "metadata_include",
                &self.metadata_include.as_ref().map(|p| p.is_some()),
            )
            .field(
                "metadata_exclude",
                &self.metadata_exclude.as_ref().map(|p| p.is_some()),
            )
            .finish()
    }
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(Some(sink));
        self
    }

    pub fn without_sink(mut self) -> Self {
        self.sink = Some(None);
        self
    }

    pub fn with_metadata_include(mut self, predicate: MetadataPredicate) -> Self {
        self.metadata_include = Some(Some(predicate));
        self
    }

    pub fn with_metadata_exclude(mut self, predicate: MetadataPredicate) -> Self {
        self.metadata_exclude = Some(Some(predicate));
        self
    }

    /// Take every field of a full settings value.
    pub fn from_settings(settings: ShipperSettings) -> Self {
        Self {
            min_level: Some(settings.min_level),
            metadata_keys: Some(settings.metadata_keys),
            format: Some(settings.format),
            buffer_size: Some(settings.buffer_size),
            max_payload_bytes: Some(settings.max_payload_bytes),
            throttle_enabled: Some(settings.throttle_enabled),
            throttle_window: Some(settings.throttle_window),
            throttle_max_repeats: Some(settings.throttle_max_repeats),
            throttle_max_entries: Some(settings.throttle_max_entries),
            verbose_path: Some(settings.verbose_path),
            exclude_patterns: Some(settings.exclude_patterns),
            immediate_patterns: Some(settings.immediate_patterns),
            ..Self::default()
        }
    }

    /// Parse TOML leniently: each key is decoded on its own and a malformed
    /// value only drops that key. A document that is not TOML at all is an
    /// error, since nothing in it can be trusted.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = raw.parse()?;
        let mut overrides = Self::default();

        if let Some(raw_level) = take::<String>(&mut table, "min_level") {
            overrides.min_level = parse_min_level(&raw_level);
        }
        overrides.metadata_keys = take(&mut table, "metadata_keys");
        overrides.format = take(&mut table, "format");
        overrides.buffer_size = take(&mut table, "buffer_size");
        overrides.max_payload_bytes = take(&mut table, "max_payload_bytes");
        overrides.throttle_enabled = take(&mut table, "throttle_enabled");
        overrides.throttle_window =
            take::<u64>(&mut table, "throttle_window_ms").map(Duration::from_millis);
        overrides.throttle_max_repeats = take(&mut table, "throttle_max_repeats");
        overrides.throttle_max_entries = take(&mut table, "throttle_max_entries");
        overrides.verbose_path = take(&mut table, "verbose_path");
        overrides.exclude_patterns = take(&mut table, "exclude_patterns");
        overrides.immediate_patterns = take(&mut table, "immediate_patterns");

        for key in table.keys() {
            warn!(key = %key, "ignoring unknown configuration key");
        }
        Ok(overrides)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Read `SHIPPER_*` environment variables. Lists are comma separated;
    /// `SHIPPER_METADATA_KEYS` also accepts `all`.
    pub fn from_env() -> Self {
        let mut overrides = Self::default();

        if let Ok(raw_level) = std::env::var("SHIPPER_MIN_LEVEL") {
            overrides.min_level = parse_min_level(&raw_level);
        }
        if let Ok(raw_keys) = std::env::var("SHIPPER_METADATA_KEYS") {
            overrides.metadata_keys = Some(if raw_keys.trim() == "all" {
                MetadataKeys::All
            } else {
                MetadataKeys::List(split_list(&raw_keys))
            });
        }
        if let Ok(format) = std::env::var("SHIPPER_FORMAT") {
            overrides.format = Some(format);
        }
        load_env_var("SHIPPER_BUFFER_SIZE", &mut overrides.buffer_size);
        load_env_var("SHIPPER_MAX_PAYLOAD_BYTES", &mut overrides.max_payload_bytes);
        load_env_var("SHIPPER_THROTTLE_ENABLED", &mut overrides.throttle_enabled);
        let mut window_ms: Option<u64> = None;
        load_env_var("SHIPPER_THROTTLE_WINDOW_MS", &mut window_ms);
        overrides.throttle_window = window_ms.map(Duration::from_millis);
        load_env_var(
            "SHIPPER_THROTTLE_MAX_REPEATS",
            &mut overrides.throttle_max_repeats,
        );
        load_env_var(
            "SHIPPER_THROTTLE_MAX_ENTRIES",
            &mut overrides.throttle_max_entries,
        );
        load_env_path("SHIPPER_VERBOSE_PATH", &mut overrides.verbose_path);
        load_env_list("SHIPPER_EXCLUDE_PATTERNS", &mut overrides.exclude_patterns);
        load_env_list(
            "SHIPPER_IMMEDIATE_PATTERNS",
            &mut overrides.immediate_patterns,
        );

        overrides
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn layer(mut self, other: ConfigOverrides) -> Self {
        macro_rules! layer_fields {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        layer_fields!(
            min_level,
            metadata_keys,
            format,
            buffer_size,
            max_payload_bytes,
            throttle_enabled,
            throttle_window,
            throttle_max_repeats,
            throttle_max_entries,
            verbose_path,
            exclude_patterns,
            immediate_patterns,
            sink,
            metadata_include,
            metadata_exclude
        );
        self
    }

    /// Apply the serializable fields onto `settings`.
    pub fn apply_to(&self, settings: &mut ShipperSettings) {
        if let Some(min_level) = self.min_level {
            settings.min_level = min_level;
        }
        if let Some(keys) = &self.metadata_keys {
            settings.metadata_keys = keys.clone();
        }
        if let Some(format) = &self.format {
            settings.format = format.clone();
        }
        if let Some(size) = self.buffer_size {
            settings.buffer_size = size;
        }
        if let Some(bytes) = self.max_payload_bytes {
            settings.max_payload_bytes = bytes;
        }
        if let Some(enabled) = self.throttle_enabled {
            settings.throttle_enabled = enabled;
        }
        if let Some(window) = self.throttle_window {
            settings.throttle_window = window;
        }
        if let Some(repeats) = self.throttle_max_repeats {
            settings.throttle_max_repeats = repeats;
        }
        if let Some(entries) = self.throttle_max_entries {
            settings.throttle_max_entries = entries;
        }
        if let Some(path) = &self.verbose_path {
            settings.verbose_path = path.clone();
        }
        if let Some(patterns) = &self.exclude_patterns {
            settings.exclude_patterns = patterns.clone();
        }
        if let Some(patterns) = &self.immediate_patterns {
            settings.immediate_patterns = patterns.clone();
        }
    }
}

fn take<T: DeserializeOwned>(table: &mut toml::Table, key: &str) -> Option<T> {
    let value = table.remove(key)?;
    match <T as serde::Deserialize>::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed configuration value");
            None
        }
    }
}

/// `none`/`all` clear the minimum level; anything else must name a level.
fn parse_min_level(raw: &str) -> Option<Option<LogLevel>> {
    match raw.trim() {
        "none" | "all" | "" => Some(None),
        other => match other.parse::<LogLevel>() {
            Ok(level) => Some(Some(level)),
            Err(e) => {
                warn!(error = %e, "ignoring malformed min_level");
                None
            }
        },
    }
}
