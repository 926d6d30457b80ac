//! Outbound side of the shipper.
//!
//! The transport that actually moves bytes to the remote collector lives
//! outside this crate; the router only talks to it through [`Sink`].

pub mod memory;
pub mod stdout;

pub use memory::{MemorySink, SentPayload};
pub use stdout::StdoutSink;

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Transport rejected payload: {0}")]
    Rejected(String),
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
    #[error("System log stream not supported by this sink")]
    Unsupported,
}

/// Destination for rendered payloads.
///
/// `send_application_log` is mandatory. System payloads are optional: a sink
/// that cannot deliver them keeps the default `supports_system_log` and the
/// router drops those payloads before calling it.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn send_application_log(&self, text: &str, correlation_id: &str)
    -> Result<(), SinkError>;

    fn supports_system_log(&self) -> bool {
        false
    }

    async fn send_system_log(&self, _text: &str) -> Result<(), SinkError> {
        Err(SinkError::Unsupported)
    }
}

pub type SharedSink = Arc<dyn Sink>;

/// Length in hex characters of a generated correlation id.
pub const CORRELATION_ID_LEN: usize = 8;

/// Short random identifier attached to every application send.
pub fn generate_correlation_id() -> String {
    let value: u32 = rand::rng().random();
    format!("{value:0width$x}", width = CORRELATION_ID_LEN)
}
