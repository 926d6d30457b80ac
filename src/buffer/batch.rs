use super::truncate::{Truncated, truncate_to_budget};
use crate::domain::Destination;
use tracing::debug;

/// Lines preallocated per buffer; larger thresholds grow on demand.
const PREALLOCATED_LINES: usize = 64;

/// Limits applied to one destination's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of pending lines that triggers a flush.
    pub max_lines: usize,
    /// Upper bound, in bytes, on a combined payload.
    pub max_payload_bytes: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_lines: 8,
            max_payload_bytes: 8192,
        }
    }
}

/// A combined payload produced by a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    destination: Destination,
    text: String,
    line_count: usize,
    truncated: bool,
}

impl Batch {
    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Pending rendered lines for one destination, in arrival order.
#[derive(Debug)]
pub struct BatchBuffer {
    destination: Destination,
    config: BatchConfig,
    pending: Vec<String>,
}

impl BatchBuffer {
    pub fn new(destination: Destination, config: BatchConfig) -> Self {
        Self {
            destination,
            config,
            pending: Vec::with_capacity(config.max_lines.min(PREALLOCATED_LINES)),
        }
    }

    /// Queue a line; returns the flushed batch when the line count reaches
    /// the threshold.
    pub fn append(&mut self, line: String) -> Option<Batch> {
        self.pending.push(line);
        if self.pending.len() >= self.config.max_lines {
            debug!(
                destination = self.destination.as_str(),
                lines = self.pending.len(),
                "batch threshold reached"
            );
            return self.flush();
        }
        None
    }

    /// Drain everything pending into one payload. `None` when empty.
    pub fn flush(&mut self) -> Option<Batch> {
        if self.pending.is_empty() {
            return None;
        }

        let line_count = self.pending.len();
        let combined = std::mem::take(&mut self.pending).join("\n");
        let Truncated { text, truncated } =
            truncate_to_budget(combined, self.config.max_payload_bytes);

        Some(Batch {
            destination: self.destination,
            text,
            line_count,
            truncated,
        })
    }

    /// New limits apply from the next append; pending lines are kept.
    pub fn reconfigure(&mut self, config: BatchConfig) {
        self.config = config;
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn config(&self) -> BatchConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
