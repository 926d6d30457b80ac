use super::config::ConfigOverrides;
use crate::domain::LogEvent;
use crate::router::{Router, RouterStats, StatsSnapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Commands queued ahead of this many are applied before new ones are accepted.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Shipper service has stopped")]
    Stopped,
    #[error("Shipper worker failed: {0}")]
    WorkerFailed(String),
}

enum Command {
    Log(LogEvent),
    Flush(oneshot::Sender<()>),
    Reconfigure(ConfigOverrides),
    SetVerbose(bool),
    ToggleVerbose(oneshot::Sender<bool>),
    Shutdown(oneshot::Sender<()>),
}

/// Spawns the worker task that owns a [`Router`].
pub struct ShipperService;

impl ShipperService {
    pub fn start(router: Router) -> ShipperHandle {
        Self::start_with(router, DEFAULT_QUEUE_CAPACITY, CancellationToken::new())
    }

    /// Start with an explicit queue capacity and cancellation token. Once
    /// `cancel` fires the worker stops accepting commands, applies whatever
    /// is already queued, flushes both buffers and exits.
    pub fn start_with(router: Router, capacity: usize, cancel: CancellationToken) -> ShipperHandle {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stats = router.stats();
        let task = tokio::spawn(run(router, rx, cancel.clone()));

        ShipperHandle {
            tx,
            stats,
            cancel,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }
}

async fn run(mut router: Router, mut rx: mpsc::Receiver<Command>, cancel: CancellationToken) {
    info!("shipper worker started");

    loop {
        let command = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("cancellation requested, draining queue");
                rx.close();
                while let Some(command) = rx.recv().await {
                    if apply(&mut router, command).await.is_break() {
                        break;
                    }
                }
                break;
            }
            command = rx.recv() => command,
        };

        let Some(command) = command else {
            debug!("all handles dropped");
            break;
        };
        if apply(&mut router, command).await.is_break() {
            info!("shipper worker stopped");
            return;
        }
    }

    router.flush().await;
    info!("shipper worker stopped");
}

async fn apply(router: &mut Router, command: Command) -> std::ops::ControlFlow<()> {
    use std::ops::ControlFlow;

    match command {
        Command::Log(event) => {
            router.handle_event(event).await;
        }
        Command::Flush(ack) => {
            router.flush().await;
            let _ = ack.send(());
        }
        Command::Reconfigure(overrides) => router.reconfigure(overrides),
        Command::SetVerbose(verbose) => router.set_verbose(verbose),
        Command::ToggleVerbose(reply) => {
            let _ = reply.send(router.toggle_verbose());
        }
        Command::Shutdown(ack) => {
            router.flush().await;
            let _ = ack.send(());
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// Cloneable front end of a running shipper. Commands from one handle are
/// applied in the order they were sent.
#[derive(Clone)]
pub struct ShipperHandle {
    tx: mpsc::Sender<Command>,
    stats: Arc<RouterStats>,
    cancel: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ShipperHandle {
    /// Queue an event. Returns once it is queued, not once it is shipped.
    pub async fn log(&self, event: LogEvent) -> Result<(), ServiceError> {
        self.send(Command::Log(event)).await
    }

    /// Flush both buffers. Everything logged before this call is drained
    /// when it returns.
    pub async fn flush(&self) -> Result<(), ServiceError> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Flush(ack)).await?;
        done.await.map_err(|_| ServiceError::Stopped)
    }

    pub async fn reconfigure(&self, overrides: ConfigOverrides) -> Result<(), ServiceError> {
        self.send(Command::Reconfigure(overrides)).await
    }

    pub async fn set_verbose(&self, verbose: bool) -> Result<(), ServiceError> {
        self.send(Command::SetVerbose(verbose)).await
    }

    /// Flip verbose mode and return the new value.
    pub async fn toggle_verbose(&self) -> Result<bool, ServiceError> {
        let (reply, value) = oneshot::channel();
        self.send(Command::ToggleVerbose(reply)).await?;
        value.await.map_err(|_| ServiceError::Stopped)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Flush and stop the worker, then wait for it to exit.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        let (ack, done) = oneshot::channel();
        if self.send(Command::Shutdown(ack)).await.is_ok() {
            let _ = done.await;
        }
        self.join().await
    }

    /// Wait for the worker to exit. Only the first caller actually waits.
    pub async fn join(&self) -> Result<(), ServiceError> {
        let task = self.task.lock().take();
        match task {
            Some(task) => task.await.map_err(|e| {
                error!(error = %e, "shipper worker panicked");
                ServiceError::WorkerFailed(e.to_string())
            }),
            None => Ok(()),
        }
    }

    async fn send(&self, command: Command) -> Result<(), ServiceError> {
        self.tx.send(command).await.map_err(|_| ServiceError::Stopped)
    }
}
