use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{self, Duration, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::core::facade::StoreError;

use super::{
    events::{ProcessorEvent, RemoteEvent},
    processor::RemoteEventProcessor,
};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("decoding remote event: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("event worker failed: {0}")]
    Worker(String),
    #[error("event listener is shut down")]
    ChannelClosed,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub event_capacity: usize,
    /// Period of the background `force_resolve` sweep while operations are
    /// pending. Zero disables it.
    pub sweep_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
            sweep_interval_ms: 0,
        }
    }
}

/// Cloneable handle to the remote event listener loop.
pub struct EventBusHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<ProcessorEvent>,
}

impl Clone for EventBusHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Deliver {
        event: RemoteEvent,
        resp: oneshot::Sender<Result<bool, RuntimeError>>,
    },
    IsConverged {
        resp: oneshot::Sender<bool>,
    },
    ForceResolve {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Starts the listener loop. Events are applied one at a time in delivery order.
pub fn spawn_event_listener(processor: RemoteEventProcessor, config: RuntimeConfig) -> EventBusHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<ProcessorEvent>(config.event_capacity);

    let events_tx_loop = events_tx.clone();
    let processor = Arc::new(processor);

    tokio::spawn(async move {
        let mut listener = Listener {
            processor,
            events_tx: events_tx_loop,
            was_pending: false,
        };

        let sweep = (config.sweep_interval_ms > 0).then(|| Duration::from_millis(config.sweep_interval_ms));
        let mut ticker = time::interval(sweep.unwrap_or(Duration::from_secs(3600)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    if listener.handle_command(cmd).await {
                        break;
                    }
                }
                _ = ticker.tick(), if sweep.is_some() && listener.was_pending => {
                    if let Err(err) = listener.force_resolve().await {
                        warn!(error = %err, "background resolve of pending operations failed");
                    }
                }
            }
        }
        debug!("remote event listener stopped");
    });

    EventBusHandle { cmd_tx, events_tx }
}

impl EventBusHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessorEvent> {
        self.events_tx.subscribe()
    }

    /// Applies `event`. Returns false when it was published by this node and skipped.
    pub async fn deliver(&self, event: RemoteEvent) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Deliver { event, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    pub async fn deliver_json(&self, json: &str) -> Result<bool, RuntimeError> {
        let event = RemoteEvent::from_json(json)?;
        self.deliver(event).await
    }

    pub async fn is_converged(&self) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::IsConverged { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    pub async fn force_resolve(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ForceResolve { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

struct Listener {
    processor: Arc<RemoteEventProcessor>,
    events_tx: broadcast::Sender<ProcessorEvent>,
    was_pending: bool,
}

impl Listener {
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Deliver { event, resp } => {
                let res = self.deliver(event).await;
                let _ = resp.send(res);
            }
            Command::IsConverged { resp } => {
                let _ = resp.send(self.processor.facade().is_converged());
            }
            Command::ForceResolve { resp } => {
                let res = self.force_resolve().await;
                let _ = resp.send(res);
            }
            Command::Shutdown { resp } => {
                let _ = resp.send(());
                return true;
            }
        }
        false
    }

    async fn deliver(&mut self, remote: RemoteEvent) -> Result<bool, RuntimeError> {
        let name = remote.event.name();
        let object_id = remote.event.object_id().map(str::to_owned);

        let processor = Arc::clone(&self.processor);
        let res = tokio::task::spawn_blocking(move || processor.process(remote))
            .await
            .map_err(|e| RuntimeError::Worker(format!("join error: {e}")))?;

        match res {
            Ok(true) => {
                let pending = !self.processor.facade().is_converged();
                let _ = self.events_tx.send(ProcessorEvent::Applied {
                    event: name,
                    object_id,
                    pending,
                });
                self.note_convergence();
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => {
                let _ = self.events_tx.send(ProcessorEvent::Failed {
                    event: name,
                    object_id,
                    error: err.to_string(),
                });
                self.note_convergence();
                Err(err.into())
            }
        }
    }

    async fn force_resolve(&mut self) -> Result<(), RuntimeError> {
        let processor = Arc::clone(&self.processor);
        let res = tokio::task::spawn_blocking(move || processor.facade().enforcer().force_resolve())
            .await
            .map_err(|e| RuntimeError::Worker(format!("join error: {e}")))?;
        self.note_convergence();
        res.map_err(RuntimeError::from)
    }

    fn note_convergence(&mut self) {
        let pending = !self.processor.facade().is_converged();
        if self.was_pending && !pending {
            let _ = self.events_tx.send(ProcessorEvent::Converged);
        }
        self.was_pending = pending;
    }
}
