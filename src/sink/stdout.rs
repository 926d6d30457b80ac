use super::{Sink, SinkError};
use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout, stdout};
use tokio::sync::Mutex;

/// Writes payloads to standard output, one block per send.
///
/// Application payloads are prefixed with their correlation id so the two
/// streams can be told apart when piped into another tool.
pub struct StdoutSink {
    out: Mutex<Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(stdout()),
        }
    }

    async fn write_block(&self, header: &str, text: &str) -> Result<(), SinkError> {
        let mut out = self.out.lock().await;
        let block = format!("{header}\n{text}\n");
        out.write_all(block.as_bytes())
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for StdoutSink {
    async fn send_application_log(
        &self,
        text: &str,
        correlation_id: &str,
    ) -> Result<(), SinkError> {
        self.write_block(&format!("=== application [{correlation_id}]"), text)
            .await
    }

    fn supports_system_log(&self) -> bool {
        true
    }

    async fn send_system_log(&self, text: &str) -> Result<(), SinkError> {
        self.write_block("=== system", text).await
    }
}
