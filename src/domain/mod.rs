//! Domain layer for rask-log-shipper.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEvent`: one host log event, consumed once by the router
//! - `LogLevel`: event severity (Debug/Info/Warn/Error/Fatal)
//! - `Destination`: application vs system payload category
//! - `ShipperError`: top-level error type

pub mod error;
pub mod log_event;
pub mod log_level;

pub use error::ShipperError;
pub use log_event::LogEvent;
pub use log_level::LogLevel;

use serde::{Deserialize, Serialize};

/// Which remote stream a rendered line belongs to. Each destination owns an
/// independent batch buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Application,
    System,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Application => "application",
            Destination::System => "system",
        }
    }
}
