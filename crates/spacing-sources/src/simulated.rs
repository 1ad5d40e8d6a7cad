//! Simulated players for running without a camera.
//!
//! Players start spread across the canvas and random-walk a pixel at a time,
//! staying inside a margin from the canvas edge.

use crate::viewport::Viewport;
use crate::{DetectionSource, SourceError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spacing_core::{ModeProfile, Point};

const MAX_SIMULATED_PLAYERS: usize = 4;
const EDGE_MARGIN_PX: f64 = 50.0;
const STEP_PX: f64 = 1.0;

pub struct SimulatedSource {
    rng: StdRng,
    players: Vec<(f64, f64)>,
    viewport: Viewport,
}

impl SimulatedSource {
    /// Spawn `player_count` players (at most four), seeded for reproducibility.
    pub fn new(player_count: usize, viewport: Viewport, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let players = (0..player_count.min(MAX_SIMULATED_PLAYERS))
            .map(|i| {
                let x = 150.0 + i as f64 * 150.0 + rng.gen_range(0.0..100.0);
                let y = 200.0 + rng.gen_range(0.0..200.0);
                (x, y)
            })
            .collect();
        let mut source = Self {
            rng,
            players,
            viewport,
        };
        source.clamp_all();
        source
    }

    /// Spawn as many players as the mode expects.
    pub fn for_mode(profile: &ModeProfile, viewport: Viewport, seed: u64) -> Self {
        Self::new(profile.player_count_hint, viewport, seed)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Random-walk every player one step.
    pub fn step(&mut self) {
        for (x, y) in &mut self.players {
            *x += self.rng.gen_range(-STEP_PX..=STEP_PX);
            *y += self.rng.gen_range(-STEP_PX..=STEP_PX);
        }
        self.clamp_all();
    }

    fn clamp_all(&mut self) {
        let max_x = (self.viewport.canvas_width - EDGE_MARGIN_PX).max(EDGE_MARGIN_PX);
        let max_y = (self.viewport.canvas_height - EDGE_MARGIN_PX).max(EDGE_MARGIN_PX);
        for (x, y) in &mut self.players {
            *x = x.clamp(EDGE_MARGIN_PX, max_x);
            *y = y.clamp(EDGE_MARGIN_PX, max_y);
        }
    }

    fn points(&self) -> Vec<Point> {
        self.players
            .iter()
            .map(|&(x, y)| Point::with_confidence(x, y, 1.0))
            .collect()
    }
}

impl DetectionSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    fn next_points(&mut self) -> Result<Option<Vec<Point>>, SourceError> {
        self.step();
        Ok(Some(self.points()))
    }
}
