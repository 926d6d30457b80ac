use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Routing counters, shared between the worker and anyone holding a handle.
#[derive(Debug, Default)]
pub struct RouterStats {
    received: AtomicU64,
    rejected: AtomicU64,
    excluded: AtomicU64,
    suppressed: AtomicU64,
    immediate_sent: AtomicU64,
    verbose_sent: AtomicU64,
    buffered: AtomicU64,
    batches_flushed: AtomicU64,
    batches_truncated: AtomicU64,
    system_dropped: AtomicU64,
    sink_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub rejected: u64,
    pub excluded: u64,
    pub suppressed: u64,
    pub immediate_sent: u64,
    pub verbose_sent: u64,
    pub buffered: u64,
    pub batches_flushed: u64,
    pub batches_truncated: u64,
    pub system_dropped: u64,
    pub sink_failures: u64,
}

macro_rules! counters {
    ($($field:ident => $record:ident),* $(,)?) => {
        impl RouterStats {
            $(
                pub fn $record(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                }
            )*

            pub fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot {
                    $($field: self.$field.load(Ordering::Relaxed),)*
                }
            }
        }
    };
}

counters! {
    received => record_received,
    rejected => record_rejected,
    excluded => record_excluded,
    suppressed => record_suppressed,
    immediate_sent => record_immediate,
    verbose_sent => record_verbose,
    buffered => record_buffered,
    batches_flushed => record_flush,
    batches_truncated => record_truncated,
    system_dropped => record_system_dropped,
    sink_failures => record_sink_failure,
}

impl RouterStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}
