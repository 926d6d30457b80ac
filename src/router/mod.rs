//! Classification, repeat throttling and dispatch of rendered log lines.

pub mod classifier;
pub mod dispatch;
pub mod stats;
pub mod throttle;

pub use classifier::{APPLICATION_MARKER, Classification, classify};
pub use dispatch::{Route, Router};
pub use stats::{RouterStats, StatsSnapshot};
pub use throttle::{
    THROTTLE_SUMMARY_MARKER, ThrottleConfig, ThrottleDecision, ThrottleEntry, ThrottleTracker,
    is_throttle_summary,
};
