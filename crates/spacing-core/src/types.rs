use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A raw detection point in canvas pixel space, produced once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Detector confidence, if the source reports one. Carried but never used for gating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            confidence: None,
        }
    }

    pub fn with_confidence(x: f64, y: f64, confidence: f32) -> Self {
        Self {
            x,
            y,
            confidence: Some(confidence),
        }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Read-only view of one tracked person.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

impl TrackedPosition {
    pub fn distance(&self, other: &TrackedPosition) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One delivery of points from a detection source.
#[derive(Debug, Clone)]
pub struct DetectionBatch {
    /// Session epoch observed when the frame was captured.
    pub epoch: u64,
    pub points: Vec<Point>,
    pub captured_at: Instant,
}

/// Game lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Countdown,
    Playing,
    GameOver,
}

impl Phase {
    /// Phases in which the clock runs and pause is allowed.
    pub fn is_timed(self) -> bool {
        matches!(self, Phase::Countdown | Phase::Playing)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Waiting => "waiting",
            Phase::Countdown => "countdown",
            Phase::Playing => "playing",
            Phase::GameOver => "game_over",
        };
        f.write_str(name)
    }
}

/// Game mode selected by the players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Comfortable spacing (mode 1).
    Relaxed,
    /// Crowded spacing (mode 2).
    Crowded,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Relaxed, Mode::Crowded];

    /// Map the 1-based mode number used on the control surface.
    pub fn from_number(number: u8) -> Option<Mode> {
        match number {
            1 => Some(Mode::Relaxed),
            2 => Some(Mode::Crowded),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Mode::Relaxed => 1,
            Mode::Crowded => 2,
        }
    }

    /// Built-in profile for this mode.
    pub const fn default_profile(self) -> ModeProfile {
        match self {
            Mode::Relaxed => ModeProfile {
                target_distance_meters: 1.2,
                player_count_hint: 1,
            },
            Mode::Crowded => ModeProfile {
                target_distance_meters: 0.6,
                player_count_hint: 2,
            },
        }
    }
}

/// Per-mode tuning carried as data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    pub target_distance_meters: f64,
    pub player_count_hint: usize,
}

/// Outbound read model for presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub mode: Option<Mode>,
    pub paused: bool,
    pub remaining_seconds: f64,
    pub score: u8,
    pub player_count: usize,
    pub positions: Vec<TrackedPosition>,
    pub epoch: u64,
}

/// Summary of a finished game.
#[derive(Debug, Clone, Serialize)]
pub struct GameResult {
    pub mode: Mode,
    pub score: u8,
    pub player_count: usize,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_numbers() {
        assert_eq!(Mode::from_number(1), Some(Mode::Relaxed));
        assert_eq!(Mode::from_number(2), Some(Mode::Crowded));
        assert_eq!(Mode::from_number(0), None);
        assert_eq!(Mode::from_number(3), None);
        for mode in Mode::ALL {
            assert_eq!(Mode::from_number(mode.number()), Some(mode));
        }
    }

    #[test]
    fn test_default_profiles() {
        let relaxed = Mode::Relaxed.default_profile();
        assert!((relaxed.target_distance_meters - 1.2).abs() < 1e-9);
        assert_eq!(relaxed.player_count_hint, 1);

        let crowded = Mode::Crowded.default_profile();
        assert!((crowded.target_distance_meters - 0.6).abs() < 1e-9);
        assert_eq!(crowded.player_count_hint, 2);
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::with_confidence(3.0, 4.0, 0.9);
        assert!((a.distance(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Phase::GameOver).unwrap(), "\"game_over\"");
        assert_eq!(Phase::GameOver.to_string(), "game_over");
        assert!(Phase::Countdown.is_timed());
        assert!(!Phase::Waiting.is_timed());
    }

    #[test]
    fn test_point_confidence_optional_in_json() {
        let p: Point = serde_json::from_str(r#"{"x": 1.5, "y": 2.0}"#).unwrap();
        assert_eq!(p, Point::new(1.5, 2.0));
    }
}
