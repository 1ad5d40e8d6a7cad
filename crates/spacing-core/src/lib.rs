//! spacing-core — Tracking and game-phase engine for the distance game.
//!
//! Turns per-frame detection points into persistent, smoothed tracks and
//! drives a pause-aware Waiting → Countdown → Playing → GameOver machine
//! that scores how closely players hold the target spacing.

pub mod clock;
pub mod config;
pub mod game;
pub mod score;
pub mod tracker;
pub mod types;

pub use clock::GameClock;
pub use config::{ConfigError, GameConfig};
pub use game::Game;
pub use score::compute_score;
pub use tracker::TrackRegistry;
pub use types::{
    DetectionBatch, GameResult, GameSnapshot, Mode, ModeProfile, Phase, Point, TrackedPosition,
};
