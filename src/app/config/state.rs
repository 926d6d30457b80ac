use super::overrides::{ConfigOverrides, MetadataPredicate};
use super::settings::ShipperSettings;
use crate::domain::LogEvent;
use crate::sink::SharedSink;
use std::fmt;

/// Everything the router reads while processing an event.
///
/// Owned by the router; changed only through [`ConfigState::merge`] and
/// the verbose toggle, both of which run between events.
#[derive(Clone, Default)]
pub struct ConfigState {
    pub settings: ShipperSettings,
    pub verbose: bool,
    pub sink: Option<SharedSink>,
    pub metadata_include: Option<MetadataPredicate>,
    pub metadata_exclude: Option<MetadataPredicate>,
}

impl fmt::Debug for ConfigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigState")
            .field("settings", &self.settings)
            .field("verbose", &self.verbose)
            .field("sink", &self.sink.is_some())
            .field("metadata_include", &self.metadata_include.is_some())
            .field("metadata_exclude", &self.metadata_exclude.is_some())
            .finish()
    }
}

impl ConfigState {
    /// Defaults merged with `overrides`.
    pub fn from_overrides(overrides: ConfigOverrides) -> Self {
        let mut state = Self::default();
        state.merge(overrides);
        state
    }

    /// Apply every field set in `overrides`, then correct out-of-range
    /// values back to defaults.
    pub fn merge(&mut self, overrides: ConfigOverrides) {
        overrides.apply_to(&mut self.settings);
        self.settings.sanitize();

        if let Some(sink) = overrides.sink {
            self.sink = sink;
        }
        if let Some(include) = overrides.metadata_include {
            self.metadata_include = include;
        }
        if let Some(exclude) = overrides.metadata_exclude {
            self.metadata_exclude = exclude;
        }
    }

    /// Host-side gate: minimum level and metadata filters. An absent include
    /// filter matches everything, an absent exclude filter matches nothing.
    pub fn accepts(&self, event: &LogEvent) -> bool {
        if let Some(min) = self.settings.min_level
            && event.level < min
        {
            return false;
        }
        if let Some(include) = &self.metadata_include
            && !include(event)
        {
            return false;
        }
        if let Some(exclude) = &self.metadata_exclude
            && exclude(event)
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LogLevel;
    use crate::sink::MemorySink;
    use std::sync::Arc;

    #[test]
    fn test_accepts_everything_by_default() {
        let state = ConfigState::default();
        assert!(state.accepts(&LogEvent::new(LogLevel::Debug, "x")));
        assert!(state.sink.is_none());
        assert!(!state.verbose);
    }

    #[test]
    fn test_min_level_and_metadata_filters() {
        let state = ConfigState::from_overrides(ConfigOverrides {
            min_level: Some(Some(LogLevel::Info)),
            ..ConfigOverrides::default()
        }
        .with_metadata_include(Arc::new(|e: &LogEvent| e.metadata_value("app").is_some()))
        .with_metadata_exclude(Arc::new(|e: &LogEvent| {
            e.metadata_value("app") == Some("noisy")
        })));

        let tagged = |level, app: &str| LogEvent::new(level, "m").with_metadata("app", app);
        assert!(state.accepts(&tagged(LogLevel::Warn, "core")));
        assert!(!state.accepts(&tagged(LogLevel::Debug, "core")));
        assert!(!state.accepts(&tagged(LogLevel::Error, "noisy")));
        assert!(!state.accepts(&LogEvent::new(LogLevel::Error, "untagged")));
    }

    #[test]
    fn test_merge_keeps_unset_fields_and_sink() {
        let sink = Arc::new(MemorySink::new());
        let mut state = ConfigState::from_overrides(ConfigOverrides::new().with_sink(sink));
        state.merge(ConfigOverrides {
            buffer_size: Some(2),
            ..ConfigOverrides::default()
        });
        assert!(state.sink.is_some());
        assert_eq!(state.settings.buffer_size, 2);

        state.merge(ConfigOverrides::new().without_sink());
        assert!(state.sink.is_none());
        assert_eq!(state.settings.buffer_size, 2);
    }

    #[test]
    fn test_merge_corrects_invalid_values() {
        let state = ConfigState::from_overrides(ConfigOverrides {
            buffer_size: Some(0),
            ..ConfigOverrides::default()
        });
        assert_eq!(state.settings.buffer_size, 8);
    }
}
