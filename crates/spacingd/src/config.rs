use spacing_core::{ConfigError, GameConfig};
use spacing_sources::{Viewport, DEFAULT_MAX_PEOPLE};
use std::path::PathBuf;

/// Where detection points come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Random-walking players, respawned for each selected mode.
    Simulated,
    /// Newline-delimited JSON frames from a file or FIFO.
    Replay(PathBuf),
}

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frame ticks per second driving the phase machine.
    pub tick_hz: u32,
    /// Detection frames per second produced by the source thread.
    pub source_fps: u32,
    pub source: SourceKind,
    /// Seed for the simulated source.
    pub seed: u64,
    /// Per-frame detection cap applied by the adapters.
    pub max_people: usize,
    pub viewport: Viewport,
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from `SPACING_*` environment variables with defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable numbers fall back to their defaults; an unreadable or
    /// invalid game config file is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut game = match lookup("SPACING_GAME_CONFIG") {
            Some(path) => GameConfig::load(&PathBuf::from(path))?,
            None => GameConfig::default(),
        };
        // On-site calibration override without editing the file.
        if let Some(ppm) = parse(&lookup, "SPACING_PIXELS_PER_METER") {
            game.pixels_per_meter = ppm;
        }
        game.validate()?;

        let source = match lookup("SPACING_SOURCE").as_deref() {
            None | Some("") | Some("simulated") => SourceKind::Simulated,
            Some(path) => SourceKind::Replay(PathBuf::from(path)),
        };

        let mut viewport = Viewport::default();
        let scale: Option<f64> = parse(&lookup, "SPACING_CAMERA_SCALE");
        if let Some(scale) = scale {
            if scale > 0.0 && scale <= 1.0 {
                viewport.camera_scale = scale;
            } else {
                tracing::warn!(scale, "SPACING_CAMERA_SCALE out of (0, 1]; using default");
            }
        }

        Ok(Self {
            tick_hz: parse(&lookup, "SPACING_TICK_HZ").filter(|&hz| hz > 0).unwrap_or(60),
            source_fps: parse(&lookup, "SPACING_SOURCE_FPS")
                .filter(|&fps| fps > 0)
                .unwrap_or(30),
            source,
            seed: parse(&lookup, "SPACING_SEED").unwrap_or(0x5eed),
            max_people: parse(&lookup, "SPACING_MAX_PEOPLE")
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_MAX_PEOPLE),
            viewport,
            game,
        })
    }
}

fn parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable value");
            None
        }
    }
}
