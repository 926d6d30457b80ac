use super::{Sink, SinkError};
use crate::domain::Destination;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One payload captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentPayload {
    pub destination: Destination,
    pub text: String,
    pub correlation_id: Option<String>,
}

/// In-process sink that records every payload it receives.
///
/// Useful for embedding the shipper where another component drains the
/// payloads, and for exercising the router in tests.
#[derive(Debug, Clone)]
pub struct MemorySink {
    sent: Arc<Mutex<Vec<SentPayload>>>,
    system_capable: bool,
    fail_sends: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            system_capable: true,
            fail_sends: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A sink that only implements the mandatory application stream.
    pub fn application_only() -> Self {
        Self {
            system_capable: false,
            ..Self::new()
        }
    }

    /// Make every subsequent send fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::Relaxed);
    }

    pub fn sent(&self) -> Vec<SentPayload> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, destination: Destination) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|p| p.destination == destination)
            .map(|p| p.text.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    fn record(&self, payload: SentPayload) -> Result<(), SinkError> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(SinkError::Unavailable("memory sink set to fail".to_string()));
        }
        self.sent.lock().push(payload);
        Ok(())
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn send_application_log(
        &self,
        text: &str,
        correlation_id: &str,
    ) -> Result<(), SinkError> {
        self.record(SentPayload {
            destination: Destination::Application,
            text: text.to_string(),
            correlation_id: Some(correlation_id.to_string()),
        })
    }

    fn supports_system_log(&self) -> bool {
        self.system_capable
    }

    async fn send_system_log(&self, text: &str) -> Result<(), SinkError> {
        if !self.system_capable {
            return Err(SinkError::Unsupported);
        }
        self.record(SentPayload {
            destination: Destination::System,
            text: text.to_string(),
            correlation_id: None,
        })
    }
}
