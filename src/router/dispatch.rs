use super::classifier::classify;
use super::stats::RouterStats;
use super::throttle::{ThrottleDecision, ThrottleTracker, is_throttle_summary};
use crate::app::config::{ConfigOverrides, ConfigState};
use crate::buffer::{Batch, BatchBuffer};
use crate::domain::{Destination, LogEvent};
use crate::format::Formatter;
use crate::sink::generate_correlation_id;
use crate::store::SharedVerboseStore;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What the router did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Rejected by the level/metadata gate before rendering.
    Rejected,
    /// Matched an exclude pattern.
    Excluded,
    /// Over the repeat limit for its text.
    Suppressed,
    /// Matched an immediate pattern and went straight to the application sink.
    Immediate,
    /// Sent on its own because verbose mode is on.
    Verbose(Destination),
    /// Queued; `flushed` is set when this line completed a batch.
    Buffered {
        destination: Destination,
        flushed: bool,
    },
}

/// The event-processing core.
///
/// Owns the configuration, the throttle table and both batch buffers. Every
/// method takes `&mut self`, so callers must serialize access; the service
/// actor in [`crate::app::service`] does exactly that.
pub struct Router {
    state: ConfigState,
    formatter: Arc<dyn Formatter>,
    store: SharedVerboseStore,
    throttle: ThrottleTracker,
    application: BatchBuffer,
    system: BatchBuffer,
    stats: Arc<RouterStats>,
}

impl Router {
    /// Build a router. The verbose flag is read from `store` here, once.
    pub fn new(
        mut state: ConfigState,
        formatter: Arc<dyn Formatter>,
        store: SharedVerboseStore,
    ) -> Self {
        state.verbose = store.read();
        let batch_config = state.settings.batch_config();
        let throttle = ThrottleTracker::new(state.settings.throttle_config());

        info!(
            verbose = state.verbose,
            sink = state.sink.is_some(),
            buffer_size = batch_config.max_lines,
            max_payload_bytes = batch_config.max_payload_bytes,
            "router initialized"
        );

        Self {
            state,
            formatter,
            store,
            throttle,
            application: BatchBuffer::new(Destination::Application, batch_config),
            system: BatchBuffer::new(Destination::System, batch_config),
            stats: RouterStats::new(),
        }
    }

    pub async fn handle_event(&mut self, event: LogEvent) -> Route {
        self.handle_event_at(event, Instant::now()).await
    }

    /// Process one event as of `now`. Never fails: sink errors are logged
    /// and counted, and the event is considered handled.
    pub async fn handle_event_at(&mut self, event: LogEvent, now: Instant) -> Route {
        self.stats.record_received();

        if !self.state.accepts(&event) {
            self.stats.record_rejected();
            return Route::Rejected;
        }

        let settings = &self.state.settings;
        let metadata = settings.metadata_keys.select(&event.metadata);
        let line = self.formatter.format(
            &settings.format,
            event.level,
            &event.message,
            &event.timestamp,
            &metadata,
        );

        let class = classify(
            &line,
            &settings.exclude_patterns,
            &settings.immediate_patterns,
        );
        if class.excluded {
            self.stats.record_excluded();
            return Route::Excluded;
        }

        // Immediate lines skip throttling as well as buffering.
        if class.immediate {
            self.stats.record_immediate();
            self.send(Destination::Application, &line).await;
            return Route::Immediate;
        }

        if !is_throttle_summary(&event.message)
            && self.throttle.should_send(&line, now) == ThrottleDecision::Suppress
        {
            self.stats.record_suppressed();
            return Route::Suppressed;
        }

        if self.state.verbose {
            self.stats.record_verbose();
            self.send(class.destination, &line).await;
            return Route::Verbose(class.destination);
        }

        self.stats.record_buffered();
        let flushed = match self.buffer_mut(class.destination).append(line) {
            Some(batch) => {
                self.ship(batch).await;
                true
            }
            None => false,
        };
        Route::Buffered {
            destination: class.destination,
            flushed,
        }
    }

    /// Flush both buffers regardless of how full they are. Empty buffers
    /// send nothing.
    pub async fn flush(&mut self) {
        for destination in [Destination::Application, Destination::System] {
            if let Some(batch) = self.buffer_mut(destination).flush() {
                self.ship(batch).await;
            }
        }
    }

    /// Merge new configuration. Takes effect for the next event.
    pub fn reconfigure(&mut self, overrides: ConfigOverrides) {
        self.state.merge(overrides);
        let batch_config = self.state.settings.batch_config();
        self.application.reconfigure(batch_config);
        self.system.reconfigure(batch_config);
        self.throttle.reconfigure(self.state.settings.throttle_config());
        debug!(state = ?self.state, "router reconfigured");
    }

    /// Set the verbose flag and persist it. Persistence is best effort.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.state.verbose = verbose;
        if let Err(e) = self.store.write(verbose) {
            warn!(error = %e, verbose, "failed to persist verbose flag");
        }
        info!(verbose, "verbose mode changed");
    }

    pub fn toggle_verbose(&mut self) -> bool {
        let verbose = !self.state.verbose;
        self.set_verbose(verbose);
        verbose
    }

    pub fn state(&self) -> &ConfigState {
        &self.state
    }

    pub fn is_verbose(&self) -> bool {
        self.state.verbose
    }

    pub fn stats(&self) -> Arc<RouterStats> {
        Arc::clone(&self.stats)
    }

    pub fn pending(&self, destination: Destination) -> usize {
        match destination {
            Destination::Application => self.application.len(),
            Destination::System => self.system.len(),
        }
    }

    pub fn throttle(&self) -> &ThrottleTracker {
        &self.throttle
    }

    fn buffer_mut(&mut self, destination: Destination) -> &mut BatchBuffer {
        match destination {
            Destination::Application => &mut self.application,
            Destination::System => &mut self.system,
        }
    }

    async fn ship(&self, batch: Batch) {
        self.stats.record_flush();
        if batch.is_truncated() {
            self.stats.record_truncated();
            debug!(
                destination = batch.destination().as_str(),
                lines = batch.line_count(),
                "combined payload truncated to byte budget"
            );
        }
        let destination = batch.destination();
        self.send(destination, batch.text()).await;
    }

    async fn send(&self, destination: Destination, text: &str) {
        let Some(sink) = self.state.sink.clone() else {
            debug!(destination = destination.as_str(), "no sink configured, payload dropped");
            return;
        };

        let result = match destination {
            Destination::Application => {
                let correlation_id = generate_correlation_id();
                sink.send_application_log(text, &correlation_id).await
            }
            Destination::System => {
                if !sink.supports_system_log() {
                    self.stats.record_system_dropped();
                    return;
                }
                sink.send_system_log(text).await
            }
        };

        if let Err(e) = result {
            self.stats.record_sink_failure();
            warn!(destination = destination.as_str(), error = %e, "sink send failed, payload dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LogLevel;
    use crate::format::TemplateFormatter;
    use crate::sink::MemorySink;
    use crate::store::{MemoryVerboseStore, VerboseStore};

    fn router(sink: &MemorySink, buffer_size: usize) -> Router {
        let state = ConfigState::from_overrides(
            ConfigOverrides {
                format: Some("$message".to_string()),
                buffer_size: Some(buffer_size),
                ..ConfigOverrides::default()
            }
            .with_sink(Arc::new(sink.clone())),
        );
        Router::new(
            state,
            Arc::new(TemplateFormatter),
            Arc::new(MemoryVerboseStore::new()),
        )
    }

    #[tokio::test]
    async fn test_routes_are_reported() {
        let sink = MemorySink::new();
        let mut r = router(&sink, 2);

        let route = r.handle_event(LogEvent::new(LogLevel::Info, "a")).await;
        assert_eq!(
            route,
            Route::Buffered {
                destination: Destination::System,
                flushed: false
            }
        );
        let route = r.handle_event(LogEvent::new(LogLevel::Info, "b")).await;
        assert_eq!(
            route,
            Route::Buffered {
                destination: Destination::System,
                flushed: true
            }
        );
        assert_eq!(sink.sent_to(Destination::System), vec!["a\nb"]);
    }

    #[tokio::test]
    async fn test_verbose_is_read_once_from_store() {
        let sink = MemorySink::new();
        let store = MemoryVerboseStore::with_value(true);
        let r = Router::new(
            ConfigState::from_overrides(ConfigOverrides::new().with_sink(Arc::new(sink))),
            Arc::new(TemplateFormatter),
            Arc::new(store.clone()),
        );
        assert!(r.is_verbose());
        // Later store changes are not picked up.
        store.write(false).unwrap();
        assert!(r.is_verbose());
    }

    #[tokio::test]
    async fn test_toggle_persists_flag() {
        let sink = MemorySink::new();
        let store = MemoryVerboseStore::new();
        let mut r = Router::new(
            ConfigState::from_overrides(ConfigOverrides::new().with_sink(Arc::new(sink))),
            Arc::new(TemplateFormatter),
            Arc::new(store.clone()),
        );
        assert!(r.toggle_verbose());
        assert_eq!(store.raw().as_deref(), Some("true"));
        assert!(!r.toggle_verbose());
        assert_eq!(store.raw().as_deref(), Some("false"));
    }
}
