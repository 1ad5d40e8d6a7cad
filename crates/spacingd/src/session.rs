use serde::Serialize;
use spacing_core::{DetectionBatch, Game, GameResult, GameSnapshot, Mode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;

/// Detection batches buffered between the source thread and the tick loop.
const BATCH_QUEUE: usize = 8;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session task exited")]
    ChannelClosed,
}

/// What the source thread needs to know to tag and shape its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceContext {
    pub epoch: u64,
    pub mode: Option<Mode>,
}

/// Reply to a status query, serialized as JSON on the bus.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub version: &'static str,
    pub source: String,
    #[serde(flatten)]
    pub game: GameSnapshot,
    pub last_result: Option<GameResult>,
    /// Batches replaced by a newer one before a tick could deliver them.
    pub superseded_batches: u64,
}

/// Messages sent from D-Bus handlers to the session task.
enum SessionRequest {
    SelectMode {
        mode: Mode,
        reply: oneshot::Sender<bool>,
    },
    TogglePause {
        reply: oneshot::Sender<bool>,
    },
    Restart {
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<StatusReport>,
    },
}

/// Clone-safe handle to the session task.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionRequest>,
}

impl SessionHandle {
    /// Returns whether the mode was accepted (only while waiting).
    pub async fn select_mode(&self, mode: Mode) -> Result<bool, SessionError> {
        self.request(|reply| SessionRequest::SelectMode { mode, reply }).await
    }

    /// Returns whether the game is paused afterwards.
    pub async fn toggle_pause(&self) -> Result<bool, SessionError> {
        self.request(|reply| SessionRequest::TogglePause { reply }).await
    }

    pub async fn restart(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionRequest::Restart { reply }).await
    }

    pub async fn status(&self) -> Result<StatusReport, SessionError> {
        self.request(|reply| SessionRequest::Status { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionRequest,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)
    }
}

/// The game plus the single-slot mailbox for detection batches.
///
/// Only the latest batch received between two ticks is delivered; older
/// ones are counted and dropped.
pub struct Session {
    game: Game,
    source_name: String,
    pending: Option<DetectionBatch>,
    superseded: u64,
}

impl Session {
    pub fn new(game: Game, source_name: impl Into<String>) -> Self {
        Self {
            game,
            source_name: source_name.into(),
            pending: None,
            superseded: 0,
        }
    }

    pub fn accept_batch(&mut self, batch: DetectionBatch) {
        if self.pending.replace(batch).is_some() {
            self.superseded += 1;
        }
    }

    /// One rendered frame: deliver the pending batch (or run expiry when the
    /// source produced nothing), then advance the game.
    pub fn on_tick(&mut self, now: Instant) {
        match self.pending.take() {
            Some(batch) => {
                self.game.deliver(batch);
            }
            None => self.game.expire(now),
        }
        self.game.tick(now);
    }

    fn handle(&mut self, req: SessionRequest, now: Instant) {
        match req {
            SessionRequest::SelectMode { mode, reply } => {
                let accepted = self.game.select_mode(mode, now);
                if accepted {
                    self.pending = None;
                }
                let _ = reply.send(accepted);
            }
            SessionRequest::TogglePause { reply } => {
                let _ = reply.send(self.game.toggle_pause(now));
            }
            SessionRequest::Restart { reply } => {
                self.game.restart();
                self.pending = None;
                let _ = reply.send(());
            }
            SessionRequest::Status { reply } => {
                let _ = reply.send(self.status());
            }
        }
    }

    pub fn context(&self) -> SourceContext {
        SourceContext {
            epoch: self.game.epoch(),
            mode: self.game.mode(),
        }
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            version: env!("CARGO_PKG_VERSION"),
            source: self.source_name.clone(),
            game: self.game.snapshot(),
            last_result: self.game.last_result().cloned(),
            superseded_batches: self.superseded,
        }
    }

    #[cfg(test)]
    fn game(&self) -> &Game {
        &self.game
    }
}

/// Endpoints for talking to a running session.
pub struct SessionChannels {
    pub handle: SessionHandle,
    /// Where the source thread sends its batches.
    pub batches: mpsc::Sender<DetectionBatch>,
    /// Current epoch and mode, for the source thread.
    pub context: watch::Receiver<SourceContext>,
}

/// Spawn the session on the tokio runtime, ticking `tick_hz` times a second.
///
/// The task exits once every [`SessionHandle`] is dropped.
pub fn spawn_session(mut session: Session, tick_hz: u32) -> SessionChannels {
    let (tx, mut rx) = mpsc::channel::<SessionRequest>(16);
    let (batch_tx, mut batch_rx) = mpsc::channel::<DetectionBatch>(BATCH_QUEUE);
    let (ctx_tx, ctx_rx) = watch::channel(session.context());
    let period = Duration::from_secs_f64(1.0 / f64::from(tick_hz.max(1)));

    tokio::spawn(async move {
        tracing::info!(tick_hz, source = %session.source_name, "session started");
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut batches_open = true;

        loop {
            tokio::select! {
                _ = interval.tick() => session.on_tick(Instant::now()),
                batch = batch_rx.recv(), if batches_open => match batch {
                    Some(batch) => session.accept_batch(batch),
                    None => {
                        tracing::info!("detection source closed; tracks will age out");
                        batches_open = false;
                    }
                },
                req = rx.recv() => match req {
                    Some(req) => session.handle(req, Instant::now()),
                    None => break,
                },
            }

            let current = session.context();
            ctx_tx.send_if_modified(|ctx| {
                if *ctx == current {
                    return false;
                }
                *ctx = current;
                true
            });
        }
        tracing::info!("session exiting");
    });

    SessionChannels {
        handle: SessionHandle { tx },
        batches: batch_tx,
        context: ctx_rx,
    }
}
