//! Game tuning constants, loadable from TOML.

use crate::types::{Mode, ModeProfile};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}

/// Tracker, timer and scoring parameters for one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Maximum pixel distance for a point to continue an existing track.
    pub match_radius_px: f64,
    /// EMA smoothing weight given to the newest sample, in (0, 1).
    pub ema_alpha: f64,
    /// Unmatched tracks are dropped after this many milliseconds.
    pub track_timeout_ms: u64,
    /// Population cap; the most recently seen tracks are kept.
    pub max_tracks: usize,
    pub countdown_seconds: f64,
    pub play_seconds: f64,
    /// Calibration: canvas pixels that correspond to one metre.
    pub pixels_per_meter: f64,
    pub relaxed: ModeProfile,
    pub crowded: ModeProfile,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            match_radius_px: 100.0,
            ema_alpha: 0.35,
            track_timeout_ms: 1200,
            max_tracks: 6,
            countdown_seconds: 3.0,
            play_seconds: 20.0,
            pixels_per_meter: 150.0,
            relaxed: Mode::Relaxed.default_profile(),
            crowded: Mode::Crowded.default_profile(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ema_alpha > 0.0 && self.ema_alpha < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "ema_alpha",
                expected: "in (0, 1)",
                value: self.ema_alpha,
            });
        }
        if self.max_tracks == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_tracks",
                expected: "at least 1",
                value: 0.0,
            });
        }
        if self.track_timeout_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "track_timeout_ms",
                expected: "positive",
                value: 0.0,
            });
        }
        let positive = [
            ("match_radius_px", self.match_radius_px),
            ("countdown_seconds", self.countdown_seconds),
            ("play_seconds", self.play_seconds),
            ("pixels_per_meter", self.pixels_per_meter),
            ("relaxed.target_distance_meters", self.relaxed.target_distance_meters),
            ("crowded.target_distance_meters", self.crowded.target_distance_meters),
        ];
        for (field, value) in positive {
            // NaN fails this comparison too.
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "positive and finite",
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn profile(&self, mode: Mode) -> ModeProfile {
        match mode {
            Mode::Relaxed => self.relaxed,
            Mode::Crowded => self.crowded,
        }
    }

    pub fn track_timeout(&self) -> Duration {
        Duration::from_millis(self.track_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tracks, 6);
        assert_eq!(config.track_timeout(), Duration::from_millis(1200));
        assert_eq!(config.countdown_seconds, 3.0);
        assert_eq!(config.play_seconds, 20.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            pixels_per_meter = 200.0
            max_tracks = 4

            [crowded]
            target_distance_meters = 0.8
            player_count_hint = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.pixels_per_meter, 200.0);
        assert_eq!(config.max_tracks, 4);
        assert_eq!(config.ema_alpha, 0.35);
        assert_eq!(config.profile(Mode::Crowded).player_count_hint, 3);
        assert_eq!(config.profile(Mode::Relaxed), Mode::Relaxed.default_profile());
    }

    #[test]
    fn test_rejects_alpha_out_of_range() {
        for alpha in ["0.0", "1.0", "1.5"] {
            let err = GameConfig::from_toml_str(&format!("ema_alpha = {alpha}")).unwrap_err();
            assert!(
                matches!(err, ConfigError::OutOfRange { field: "ema_alpha", .. }),
                "alpha {alpha}: {err}"
            );
        }
    }

    #[test]
    fn test_rejects_zero_max_tracks() {
        let err = GameConfig::from_toml_str("max_tracks = 0").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "max_tracks", .. }));
    }

    #[test]
    fn test_rejects_non_positive_durations() {
        let err = GameConfig::from_toml_str("play_seconds = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "play_seconds", .. }));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = GameConfig::from_toml_str("max_tracks = \"six\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = GameConfig::load(Path::new("/nonexistent/spacing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
