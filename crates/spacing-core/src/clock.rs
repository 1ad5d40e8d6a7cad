//! Pause-aware phase timer.
//!
//! On resume the phase start is shifted later by the paused duration, so
//! `elapsed` never advances while paused and never jumps on resume.

use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone)]
pub struct GameClock {
    phase_started_at: Option<Instant>,
    paused_at: Option<Instant>,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a new phase at `now`.
    pub fn start_phase(&mut self, now: Instant) -> Instant {
        self.phase_started_at = Some(now);
        now
    }

    /// No-op if already paused.
    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Resume and return the paused duration, or `None` if not paused.
    pub fn resume(&mut self, now: Instant) -> Option<Duration> {
        let paused_at = self.paused_at.take()?;
        let delta = now.saturating_duration_since(paused_at);
        if let Some(start) = self.phase_started_at.as_mut() {
            *start += delta;
        }
        Some(delta)
    }

    /// Time spent in the current phase, excluding paused time.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let Some(start) = self.phase_started_at else {
            return Duration::ZERO;
        };
        let end = self.paused_at.unwrap_or(now);
        end.saturating_duration_since(start)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Forget the phase start and any pause.
    pub fn reset(&mut self) {
        self.phase_started_at = None;
        self.paused_at = None;
    }
}
