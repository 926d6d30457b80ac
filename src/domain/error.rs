use thiserror::Error;

/// Top-level error type for the shipper.
///
/// None of these ever escape the event-processing entry points; they are
/// surfaced by the setup and control paths only.
#[derive(Error, Debug)]
pub enum ShipperError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Sink error: {0}")]
    Sink(#[from] crate::sink::SinkError),

    #[error("Verbose store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Service error: {0}")]
    Service(#[from] crate::app::ServiceError),

    #[error("Logging setup error: {0}")]
    Logging(#[from] crate::app::LoggingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
