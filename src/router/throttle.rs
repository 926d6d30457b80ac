//! Repeat suppression keyed by exact rendered text.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Messages starting with this marker are throttle summaries and are never
/// throttled themselves.
pub const THROTTLE_SUMMARY_MARKER: &str = "[throttle-summary]";

/// Whether `message` (the raw message, not the rendered line) is a summary.
pub fn is_throttle_summary(message: &str) -> bool {
    message.starts_with(THROTTLE_SUMMARY_MARKER)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub enabled: bool,
    pub window: Duration,
    pub max_repeats: u32,
    /// Upper bound on distinct texts tracked at once.
    pub max_entries: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: Duration::from_secs(60),
            max_repeats: 3,
            max_entries: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Send,
    Suppress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleEntry {
    pub count: u32,
    pub first_seen: Instant,
}

/// Per-text repeat counters with time-window expiry.
///
/// `order` holds keys in insertion order. Since `first_seen` is only set on
/// insertion and time is monotonic, the front of the queue is always the
/// oldest live entry, which makes expiry and capacity eviction pop from the
/// front only.
#[derive(Debug)]
pub struct ThrottleTracker {
    config: ThrottleConfig,
    entries: HashMap<Arc<str>, ThrottleEntry>,
    order: VecDeque<Arc<str>>,
}

impl ThrottleTracker {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn should_send(&mut self, text: &str, now: Instant) -> ThrottleDecision {
        if !self.config.enabled {
            return ThrottleDecision::Send;
        }

        self.expire(now);

        let count = match self.entries.get_mut(text) {
            Some(entry) => {
                entry.count = entry.count.saturating_add(1);
                entry.count
            }
            None => {
                self.make_room();
                let key: Arc<str> = Arc::from(text);
                self.entries.insert(
                    Arc::clone(&key),
                    ThrottleEntry {
                        count: 1,
                        first_seen: now,
                    },
                );
                self.order.push_back(key);
                1
            }
        };

        if count <= self.config.max_repeats {
            ThrottleDecision::Send
        } else {
            ThrottleDecision::Suppress
        }
    }

    /// Drop every entry whose age exceeds the window.
    pub fn expire(&mut self, now: Instant) {
        while let Some(key) = self.order.front() {
            let expired = self
                .entries
                .get(key)
                .is_none_or(|e| now.saturating_duration_since(e.first_seen) > self.config.window);
            if !expired {
                break;
            }
            if let Some(key) = self.order.pop_front() {
                self.entries.remove(&key);
            }
        }
    }

    fn make_room(&mut self) {
        while self.entries.len() >= self.config.max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.entries.remove(&oldest).is_some() {
                debug!(tracked = self.entries.len(), "throttle table full, evicted oldest text");
            }
        }
    }

    /// Window or limit changes apply to existing entries from the next call.
    pub fn reconfigure(&mut self, config: ThrottleConfig) {
        self.config = config;
        self.make_room();
    }

    pub fn config(&self) -> ThrottleConfig {
        self.config
    }

    pub fn entry(&self, text: &str) -> Option<ThrottleEntry> {
        self.entries.get(text).copied()
    }

    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}
