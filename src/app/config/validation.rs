use super::settings::{
    DEFAULT_BUFFER_SIZE, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_THROTTLE_MAX_ENTRIES, ShipperSettings,
};
use super::ConfigError;
use crate::buffer::TRUNCATION_MARKER;
use tracing::warn;

impl ShipperSettings {
    /// Replace out-of-range values with their defaults.
    ///
    /// Returns one error per corrected field; each is also logged. The
    /// settings are always usable afterwards.
    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let mut corrected = Vec::new();

        if self.buffer_size == 0 {
            corrected.push(ConfigError::InvalidValue {
                key: "buffer_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
            self.buffer_size = DEFAULT_BUFFER_SIZE;
        }

        if self.max_payload_bytes <= TRUNCATION_MARKER.len() {
            corrected.push(ConfigError::InvalidValue {
                key: "max_payload_bytes".to_string(),
                reason: format!(
                    "must be larger than the truncation marker ({} bytes)",
                    TRUNCATION_MARKER.len()
                ),
            });
            self.max_payload_bytes = DEFAULT_MAX_PAYLOAD_BYTES;
        }

        if self.throttle_max_entries == 0 {
            corrected.push(ConfigError::InvalidValue {
                key: "throttle_max_entries".to_string(),
                reason: "must be greater than 0".to_string(),
            });
            self.throttle_max_entries = DEFAULT_THROTTLE_MAX_ENTRIES;
        }

        let before = self.exclude_patterns.len() + self.immediate_patterns.len();
        self.exclude_patterns.retain(|p| !p.is_empty());
        self.immediate_patterns.retain(|p| !p.is_empty());
        if self.exclude_patterns.len() + self.immediate_patterns.len() != before {
            // An empty pattern would match every line.
            corrected.push(ConfigError::InvalidValue {
                key: "exclude_patterns/immediate_patterns".to_string(),
                reason: "empty patterns removed".to_string(),
            });
        }

        for error in &corrected {
            warn!(%error, "configuration corrected, default applies");
        }
        corrected
    }
}
