#![warn(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Safe within realistic value bounds (durations, sizes)
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. RouterStats in router module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod buffer;
pub mod domain;
pub mod format;
pub mod router;
pub mod sink;
pub mod store;

// Re-export main types for easy access
pub use app::{App, ConfigOverrides, ConfigState, ShipperHandle, ShipperService};
pub use domain::{Destination, LogEvent, LogLevel, ShipperError};
pub use format::{Formatter, MetadataKeys, TemplateFormatter};
pub use router::{Route, Router, StatsSnapshot};
pub use sink::{SharedSink, Sink, SinkError};
pub use store::{FileVerboseStore, MemoryVerboseStore, VerboseStore};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
