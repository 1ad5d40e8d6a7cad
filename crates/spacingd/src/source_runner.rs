//! Detection intake thread.
//!
//! Sources block (file reads, FIFOs) so they run on a dedicated OS thread,
//! not on the runtime. Every batch is tagged with the epoch that was current
//! when it was captured; the session discards it if the epoch moved on.

use crate::config::{Config, SourceKind};
use crate::session::SourceContext;
use spacing_core::{DetectionBatch, GameConfig};
use spacing_sources::{DetectionSource, ReplaySource, SimulatedSource, SourceError, Viewport};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

enum Feed {
    /// Respawned for every epoch with the selected mode's player count.
    Simulated {
        seed: u64,
        viewport: Viewport,
        game: GameConfig,
        epoch: Option<u64>,
        current: Option<SimulatedSource>,
    },
    Fixed(Box<dyn DetectionSource>),
}

pub struct SourceRunner {
    feed: Feed,
}

impl SourceRunner {
    pub fn simulated(seed: u64, viewport: Viewport, game: GameConfig) -> Self {
        Self {
            feed: Feed::Simulated {
                seed,
                viewport,
                game,
                epoch: None,
                current: None,
            },
        }
    }

    pub fn fixed(source: Box<dyn DetectionSource>) -> Self {
        Self {
            feed: Feed::Fixed(source),
        }
    }

    /// Build the runner the daemon config asks for. Opens replay files eagerly.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Ok(match &config.source {
            SourceKind::Simulated => {
                Self::simulated(config.seed, config.viewport, config.game.clone())
            }
            SourceKind::Replay(path) => Self::fixed(Box::new(ReplaySource::open(
                path,
                config.viewport,
                config.max_people,
            )?)),
        })
    }

    pub fn name(&self) -> &str {
        match &self.feed {
            Feed::Simulated { .. } => "simulated",
            Feed::Fixed(source) => source.name(),
        }
    }

    /// Produce the next batch for `ctx`, or `None` once the source is exhausted.
    ///
    /// Source errors yield an empty batch so missing people still age out.
    pub fn next_batch(&mut self, ctx: SourceContext) -> Option<DetectionBatch> {
        let source: Option<&mut dyn DetectionSource> = match &mut self.feed {
            Feed::Simulated {
                seed,
                viewport,
                game,
                epoch,
                current,
            } => {
                if *epoch != Some(ctx.epoch) {
                    *epoch = Some(ctx.epoch);
                    *current = ctx.mode.map(|mode| {
                        SimulatedSource::for_mode(&game.profile(mode), *viewport, *seed ^ ctx.epoch)
                    });
                    tracing::debug!(
                        epoch = ctx.epoch,
                        players = current.as_ref().map_or(0, SimulatedSource::player_count),
                        "simulated players respawned"
                    );
                }
                current.as_mut().map(|s| s as &mut dyn DetectionSource)
            }
            Feed::Fixed(source) => Some(source.as_mut()),
        };

        let points = match source {
            None => Vec::new(),
            Some(source) => match source.next_points() {
                Ok(Some(points)) => points,
                Ok(None) => return None,
                Err(err) => {
                    tracing::warn!(error = %err, "detection failed; sending empty frame");
                    Vec::new()
                }
            },
        };

        Some(DetectionBatch {
            epoch: ctx.epoch,
            points,
            captured_at: Instant::now(),
        })
    }
}

/// Run `runner` on a dedicated OS thread at `fps` frames per second.
///
/// The thread exits when the source is exhausted or the session is gone.
pub fn spawn_source_thread(
    mut runner: SourceRunner,
    fps: u32,
    batches: mpsc::Sender<DetectionBatch>,
    context: watch::Receiver<SourceContext>,
) -> std::io::Result<JoinHandle<()>> {
    let period = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));

    std::thread::Builder::new()
        .name("spacing-source".into())
        .spawn(move || {
            tracing::info!(source = runner.name(), fps, "source thread started");
            loop {
                let ctx = *context.borrow();
                let Some(batch) = runner.next_batch(ctx) else {
                    tracing::info!(source = runner.name(), "source exhausted");
                    break;
                };
                if batches.blocking_send(batch).is_err() {
                    break;
                }
                std::thread::sleep(period);
            }
            tracing::info!("source thread exiting");
        })
}
