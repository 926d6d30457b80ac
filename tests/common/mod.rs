#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use rask_log_shipper::app::{ConfigOverrides, ConfigState};
use rask_log_shipper::format::TemplateFormatter;
use rask_log_shipper::router::Router;
use rask_log_shipper::sink::{MemorySink, Sink, SinkError};
use rask_log_shipper::store::MemoryVerboseStore;
use std::sync::Arc;

mock! {
    pub TestSink {}

    #[async_trait]
    impl Sink for TestSink {
        async fn send_application_log(&self, text: &str, correlation_id: &str) -> Result<(), SinkError>;
        fn supports_system_log(&self) -> bool;
        async fn send_system_log(&self, text: &str) -> Result<(), SinkError>;
    }
}

/// Overrides that render only the message text, so payloads are easy to
/// compare.
pub fn plain_overrides() -> ConfigOverrides {
    ConfigOverrides {
        format: Some("$message".to_string()),
        ..ConfigOverrides::default()
    }
}

pub fn router_with(overrides: ConfigOverrides) -> Router {
    router_with_store(overrides, MemoryVerboseStore::new())
}

pub fn router_with_store(overrides: ConfigOverrides, store: MemoryVerboseStore) -> Router {
    Router::new(
        ConfigState::from_overrides(overrides),
        Arc::new(TemplateFormatter),
        Arc::new(store),
    )
}

/// Router over a [`MemorySink`] with the given buffer threshold.
pub fn memory_router(sink: &MemorySink, buffer_size: usize) -> Router {
    router_with(
        ConfigOverrides {
            buffer_size: Some(buffer_size),
            ..plain_overrides()
        }
        .with_sink(Arc::new(sink.clone())),
    )
}
