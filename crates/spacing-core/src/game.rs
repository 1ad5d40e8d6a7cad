//! Phase state machine.
//!
//! `Game` is total: every control operation is defined in every phase, and
//! transitions that do not apply are ignored. Driven by one `tick` per
//! rendered frame; there is no timer of its own.

use crate::clock::GameClock;
use crate::config::GameConfig;
use crate::score::compute_score;
use crate::tracker::{TrackRegistry, TrackerParams};
use crate::types::{DetectionBatch, GameResult, GameSnapshot, Mode, Phase, TrackedPosition};
use std::time::Instant;

/// Owns the clock, the track registry and all per-game state.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    phase: Phase,
    mode: Option<Mode>,
    clock: GameClock,
    tracks: TrackRegistry,
    remaining_seconds: f64,
    score: u8,
    /// Bumped on every mode selection and restart; batches captured under an
    /// older epoch are discarded.
    epoch: u64,
    last_result: Option<GameResult>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let tracks = TrackRegistry::new(TrackerParams::from(&config));
        Self {
            config,
            phase: Phase::Waiting,
            mode: None,
            clock: GameClock::new(),
            tracks,
            remaining_seconds: 0.0,
            score: 0,
            epoch: 0,
            last_result: None,
        }
    }

    /// Waiting → Countdown. Ignored in any other phase.
    pub fn select_mode(&mut self, mode: Mode, now: Instant) -> bool {
        if self.phase != Phase::Waiting {
            tracing::debug!(phase = %self.phase, ?mode, "select_mode ignored");
            return false;
        }

        self.mode = Some(mode);
        self.phase = Phase::Countdown;
        self.clock.reset();
        self.clock.start_phase(now);
        self.tracks.clear();
        self.score = 0;
        self.remaining_seconds = self.config.countdown_seconds;
        self.epoch += 1;

        let profile = self.config.profile(mode);
        tracing::info!(
            mode = mode.number(),
            target_m = profile.target_distance_meters,
            players = profile.player_count_hint,
            epoch = self.epoch,
            "countdown started"
        );
        true
    }

    /// Pause or resume. Only valid in Countdown and Playing.
    ///
    /// Returns whether the game is paused after the call.
    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        if !self.phase.is_timed() {
            tracing::debug!(phase = %self.phase, "toggle_pause ignored");
            return false;
        }

        if self.clock.is_paused() {
            if let Some(paused_for) = self.clock.resume(now) {
                // Paused time must not count against tracks either.
                self.tracks.shift_last_seen(paused_for);
                tracing::info!(paused_ms = paused_for.as_millis() as u64, "resumed");
            }
            false
        } else {
            self.clock.pause(now);
            tracing::info!(phase = %self.phase, "paused");
            true
        }
    }

    /// Any phase → Waiting, clearing mode, clock, tracks and score.
    pub fn restart(&mut self) {
        if self.phase == Phase::Waiting {
            return;
        }
        self.phase = Phase::Waiting;
        self.mode = None;
        self.clock.reset();
        self.tracks.clear();
        self.score = 0;
        self.remaining_seconds = 0.0;
        self.epoch += 1;
        tracing::info!(epoch = self.epoch, "restarted");
    }

    /// Ingest one detection batch.
    ///
    /// Dropped when it was captured under an older epoch or while paused.
    /// Returns whether the batch was applied.
    pub fn deliver(&mut self, batch: DetectionBatch) -> bool {
        if batch.epoch != self.epoch {
            tracing::debug!(
                batch_epoch = batch.epoch,
                epoch = self.epoch,
                "discarding stale detection batch"
            );
            return false;
        }
        if self.clock.is_paused() {
            return false;
        }
        self.tracks.ingest(&batch.points, batch.captured_at);
        true
    }

    /// Run track expiry for a frame that produced no batch. Suspended while paused.
    pub fn expire(&mut self, now: Instant) {
        if self.clock.is_paused() {
            return;
        }
        self.tracks.expire_and_cap(now);
    }

    /// Advance timers and phases. At most one transition per call.
    pub fn tick(&mut self, now: Instant) {
        if self.clock.is_paused() {
            return;
        }

        match self.phase {
            Phase::Waiting | Phase::GameOver => {}
            Phase::Countdown => {
                let duration = self.config.countdown_seconds;
                let elapsed = self.clock.elapsed(now).as_secs_f64();
                self.remaining_seconds = (duration - elapsed).max(0.0);
                if elapsed >= duration {
                    self.phase = Phase::Playing;
                    self.clock.start_phase(now);
                    self.score = 0;
                    self.remaining_seconds = self.config.play_seconds;
                    tracing::info!(players = self.tracks.len(), "playing");
                }
            }
            Phase::Playing => {
                let duration = self.config.play_seconds;
                let elapsed = self.clock.elapsed(now).as_secs_f64();
                self.remaining_seconds = (duration - elapsed).max(0.0);
                if elapsed >= duration {
                    self.finish();
                }
            }
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::GameOver;
        self.remaining_seconds = 0.0;

        let positions = self.tracks.current_positions();
        let Some(mode) = self.mode else {
            return;
        };
        let profile = self.config.profile(mode);
        self.score = compute_score(
            &positions,
            profile.target_distance_meters,
            self.config.pixels_per_meter,
        );

        let result = GameResult {
            mode,
            score: self.score,
            player_count: positions.len(),
            finished_at: chrono::Utc::now(),
        };
        tracing::info!(
            mode = mode.number(),
            score = result.score,
            players = result.player_count,
            "game over"
        );
        self.last_result = Some(result);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Seconds left in the current timed phase as of the last tick.
    pub fn remaining_seconds(&self) -> f64 {
        self.remaining_seconds
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current_positions(&self) -> Vec<TrackedPosition> {
        self.tracks.current_positions()
    }

    pub fn player_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Result of the most recent finished game, kept across restarts.
    pub fn last_result(&self) -> Option<&GameResult> {
        self.last_result.as_ref()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let positions = self.current_positions();
        GameSnapshot {
            phase: self.phase,
            mode: self.mode,
            paused: self.is_paused(),
            remaining_seconds: self.remaining_seconds,
            score: self.score,
            player_count: positions.len(),
            positions,
            epoch: self.epoch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;
    use std::time::Duration;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn batch(game: &Game, points: Vec<Point>, at: Instant) -> DetectionBatch {
        DetectionBatch {
            epoch: game.epoch(),
            points,
            captured_at: at,
        }
    }

    #[test]
    fn test_full_phase_sequence() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        assert_eq!(game.phase(), Phase::Waiting);

        assert!(game.select_mode(Mode::from_number(1).unwrap(), t0));
        assert_eq!(game.phase(), Phase::Countdown);
        assert_eq!(game.mode(), Some(Mode::Relaxed));

        game.tick(t0 + secs(2.9));
        assert_eq!(game.phase(), Phase::Countdown);
        assert!((game.remaining_seconds() - 0.1).abs() < 1e-6);

        let play_start = t0 + secs(3.0);
        game.tick(play_start);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.remaining_seconds(), 20.0);

        game.tick(play_start + secs(19.5));
        assert_eq!(game.phase(), Phase::Playing);
        assert!((game.remaining_seconds() - 0.5).abs() < 1e-6);

        game.tick(play_start + secs(20.0));
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.remaining_seconds(), 0.0);

        game.restart();
        assert_eq!(game.phase(), Phase::Waiting);
        assert_eq!(game.mode(), None);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_one_transition_per_tick() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Relaxed, t0);
        // A single very late tick only leaves the countdown.
        game.tick(t0 + secs(60.0));
        assert_eq!(game.phase(), Phase::Playing);
    }

    #[test]
    fn test_select_mode_ignored_outside_waiting() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Relaxed, t0);
        let epoch = game.epoch();
        assert!(!game.select_mode(Mode::Crowded, t0 + secs(1.0)));
        assert_eq!(game.mode(), Some(Mode::Relaxed));
        assert_eq!(game.epoch(), epoch);
    }

    #[test]
    fn test_toggle_pause_ignored_when_waiting_or_over() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        assert!(!game.toggle_pause(t0));
        assert!(!game.is_paused());

        game.select_mode(Mode::Relaxed, t0);
        game.tick(t0 + secs(3.0));
        game.tick(t0 + secs(23.0));
        assert_eq!(game.phase(), Phase::GameOver);
        assert!(!game.toggle_pause(t0 + secs(24.0)));
        assert!(!game.is_paused());
    }

    #[test]
    fn test_pause_freezes_countdown() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Relaxed, t0);

        game.tick(t0 + secs(1.0));
        assert!(game.toggle_pause(t0 + secs(1.0)));
        game.tick(t0 + secs(30.0));
        assert_eq!(game.phase(), Phase::Countdown);
        assert!((game.remaining_seconds() - 2.0).abs() < 1e-6);

        assert!(!game.toggle_pause(t0 + secs(30.0)));
        game.tick(t0 + secs(31.0));
        assert_eq!(game.phase(), Phase::Countdown);
        assert!((game.remaining_seconds() - 1.0).abs() < 1e-6);

        game.tick(t0 + secs(32.0));
        assert_eq!(game.phase(), Phase::Playing);
    }

    #[test]
    fn test_pause_does_not_expire_tracks() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Crowded, t0);
        game.tick(t0 + secs(3.0));

        let seen = t0 + secs(4.0);
        assert!(game.deliver(batch(&game, vec![Point::new(100.0, 100.0)], seen)));
        game.toggle_pause(seen);
        game.toggle_pause(seen + secs(10.0));

        // 0.5 s of unpaused time since the track was last seen.
        let empty = batch(&game, vec![], seen + secs(10.5));
        assert!(game.deliver(empty));
        assert_eq!(game.player_count(), 1);

        let empty = batch(&game, vec![], seen + secs(11.5));
        game.deliver(empty);
        assert_eq!(game.player_count(), 0);
    }

    #[test]
    fn test_batches_dropped_while_paused() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Relaxed, t0);
        game.toggle_pause(t0 + secs(0.5));
        assert!(!game.deliver(batch(&game, vec![Point::new(1.0, 1.0)], t0 + secs(0.6))));
        assert_eq!(game.player_count(), 0);
    }

    #[test]
    fn test_stale_epoch_discarded() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Relaxed, t0);
        let stale = batch(&game, vec![Point::new(10.0, 10.0)], t0);

        game.restart();
        game.select_mode(Mode::Crowded, t0 + secs(1.0));

        assert!(!game.deliver(stale));
        assert_eq!(game.player_count(), 0);

        let fresh = batch(&game, vec![Point::new(10.0, 10.0)], t0 + secs(1.1));
        assert!(game.deliver(fresh));
        assert_eq!(game.player_count(), 1);
    }

    #[test]
    fn test_select_mode_clears_tracks() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        assert!(game.deliver(batch(&game, vec![Point::new(5.0, 5.0)], t0)));
        assert_eq!(game.player_count(), 1);
        game.select_mode(Mode::Relaxed, t0);
        assert_eq!(game.player_count(), 0);
    }

    #[test]
    fn test_final_score_from_positions() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Crowded, t0);
        game.tick(t0 + secs(3.0));

        // 0.6 m * 150 px/m = 90 px apart.
        let at = t0 + secs(22.5);
        let points = vec![Point::new(300.0, 300.0), Point::new(390.0, 300.0)];
        assert!(game.deliver(batch(&game, points, at)));
        game.tick(t0 + secs(23.0));

        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.score(), 100);
        let result = game.last_result().unwrap();
        assert_eq!(result.mode, Mode::Crowded);
        assert_eq!(result.player_count, 2);

        game.restart();
        assert_eq!(game.score(), 0);
        assert!(game.last_result().is_some());
    }

    #[test]
    fn test_single_player_scores_zero() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Relaxed, t0);
        game.tick(t0 + secs(3.0));
        game.deliver(batch(&game, vec![Point::new(300.0, 300.0)], t0 + secs(22.9)));
        game.tick(t0 + secs(23.0));
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_expire_without_batches_drops_departed_players() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Relaxed, t0);
        game.tick(t0 + secs(3.0));

        let points = vec![Point::new(300.0, 300.0), Point::new(480.0, 300.0)];
        assert!(game.deliver(batch(&game, points, t0 + secs(4.0))));
        game.expire(t0 + secs(5.0));
        assert_eq!(game.player_count(), 2);

        game.expire(t0 + secs(5.5));
        assert_eq!(game.player_count(), 0);

        game.tick(t0 + secs(23.0));
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_expire_suspended_while_paused() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Relaxed, t0);
        game.deliver(batch(&game, vec![Point::new(300.0, 300.0)], t0));
        game.toggle_pause(t0 + secs(0.5));
        game.expire(t0 + secs(10.0));
        assert_eq!(game.player_count(), 1);
    }

    #[test]
    fn test_restart_from_playing() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Relaxed, t0);
        game.tick(t0 + secs(3.0));
        game.toggle_pause(t0 + secs(4.0));
        game.restart();
        assert_eq!(game.phase(), Phase::Waiting);
        assert!(!game.is_paused());
        assert_eq!(game.remaining_seconds(), 0.0);
    }

    #[test]
    fn test_restart_in_waiting_is_noop() {
        let mut game = Game::new(GameConfig::default());
        game.restart();
        assert_eq!(game.epoch(), 0);
    }

    #[test]
    fn test_snapshot() {
        let t0 = Instant::now();
        let mut game = Game::new(GameConfig::default());
        game.select_mode(Mode::Crowded, t0);
        game.deliver(batch(&game, vec![Point::new(1.0, 2.0)], t0));
        game.tick(t0 + secs(1.0));

        let snap = game.snapshot();
        assert_eq!(snap.phase, Phase::Countdown);
        assert_eq!(snap.mode, Some(Mode::Crowded));
        assert_eq!(snap.player_count, 1);
        assert_eq!(snap.epoch, 1);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "countdown");
        assert_eq!(json["mode"], "crowded");
        assert_eq!(json["positions"][0]["id"], 1);
    }
}
