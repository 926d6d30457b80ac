pub mod config;
pub mod logging_system;
pub mod service;

pub use config::{
    Cli, ConfigError, ConfigOverrides, ConfigState, LogFormat, ShipperSettings, TracingLevel,
};
pub use logging_system::{LoggingError, LoggingSystem, setup_logging};
pub use service::{ServiceError, ShipperHandle, ShipperService};

use crate::domain::{LogEvent, LogLevel, ShipperError};
use crate::format::TemplateFormatter;
use crate::router::Router;
use crate::sink::StdoutSink;
use crate::store::FileVerboseStore;
use clap::Parser;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Control line that flushes both buffers.
pub const FLUSH_COMMAND: &str = "!flush";
/// Control line that toggles verbose mode.
pub const VERBOSE_COMMAND: &str = "!verbose";

/// The stdin-driven shipper used by the binary.
pub struct App {
    handle: ShipperHandle,
}

impl App {
    pub fn new(handle: ShipperHandle) -> Self {
        Self { handle }
    }

    pub fn from_args<I, T>(args: I) -> Result<Self, ShipperError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::from_args(args)?;
        Self::from_cli(&cli)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, ShipperError> {
        let overrides = cli
            .resolve_overrides()?
            .with_sink(Arc::new(StdoutSink::new()));
        let state = ConfigState::from_overrides(overrides);

        info!("Starting rask-log-shipper v{}", crate::VERSION);
        info!(
            buffer_size = state.settings.buffer_size,
            max_payload_bytes = state.settings.max_payload_bytes,
            throttle_enabled = state.settings.throttle_enabled,
            verbose_path = %state.settings.verbose_path.display(),
            "configuration loaded"
        );

        let store = Arc::new(FileVerboseStore::new(state.settings.verbose_path.clone()));
        let router = Router::new(state, Arc::new(TemplateFormatter), store);

        Ok(Self::new(ShipperService::start(router)))
    }

    pub fn handle(&self) -> &ShipperHandle {
        &self.handle
    }

    /// Read stdin until EOF or Ctrl-C, then flush and stop.
    pub async fn run(self) -> Result<(), ShipperError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let cancel = self.handle.cancellation_token();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                    cancel.cancel();
                }
                Err(e) => warn!(error = %e, "failed to listen for SIGINT"),
            }
        });

        self.run_with(stdin).await
    }

    /// Feed lines from `input` into the shipper. Generic over the reader so
    /// it can be driven from tests.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than ending the
    /// loop; a read error stops reading but still flushes on shutdown.
    pub async fn run_with<R>(self, mut input: R) -> Result<(), ShipperError>
    where
        R: AsyncBufRead + Unpin,
    {
        let cancel = self.handle.cancellation_token();
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let read = tokio::select! {
                () = cancel.cancelled() => break,
                read = input.read_until(b'\n', &mut raw) => read,
            };
            match read {
                Ok(0) => {
                    info!("input closed");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "failed to read input, stopping");
                    break;
                }
            }

            let line = decode_line(&raw);
            let command = line.trim();
            let result = if command == FLUSH_COMMAND {
                self.handle.flush().await
            } else if command == VERBOSE_COMMAND {
                self.handle.toggle_verbose().await.map(|verbose| {
                    info!(verbose, "verbose toggled from input");
                })
            } else {
                self.handle.log(LogEvent::new(LogLevel::Info, line)).await
            };
            match result {
                Ok(()) => {}
                // Cancelled between reading the line and queueing it.
                Err(ServiceError::Stopped) => break,
                Err(e) => return Err(e.into()),
            }
        }

        self.handle.shutdown().await?;
        let stats = self.handle.stats();
        info!(
            received = stats.received,
            batches = stats.batches_flushed,
            suppressed = stats.suppressed,
            excluded = stats.excluded,
            sink_failures = stats.sink_failures,
            "rask-log-shipper stopped"
        );
        Ok(())
    }
}

/// Strip the line terminator and decode, replacing invalid UTF-8.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    match String::from_utf8_lossy(raw) {
        Cow::Borrowed(line) => line.to_string(),
        Cow::Owned(line) => {
            warn!(bytes = raw.len(), "input line was not valid UTF-8, replaced invalid bytes");
            line
        }
    }
}

/// Entry point of the binary.
pub async fn main() -> Result<(), ShipperError> {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(cli.log_level, cli.log_format) {
        eprintln!("Warning: {e}");
    }
    App::from_cli(&cli)?.run().await
}
