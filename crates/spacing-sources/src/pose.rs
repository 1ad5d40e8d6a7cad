//! Single-person pose landmarks → one point at the nose.

use crate::viewport::Viewport;
use serde::Deserialize;
use spacing_core::Point;

/// Index of the nose in the 33-landmark body pose layout.
pub const NOSE: usize = 0;

/// A normalized pose landmark.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Landmark visibility, used as point confidence when present.
    #[serde(default)]
    pub visibility: Option<f32>,
}

/// Convert one pose result into at most one point.
pub fn points_from_landmarks(landmarks: &[Landmark], viewport: &Viewport) -> Vec<Point> {
    let Some(nose) = landmarks.get(NOSE) else {
        return Vec::new();
    };
    let confidence = nose.visibility.unwrap_or(1.0);
    vec![viewport.map_normalized(nose.x, nose.y, Some(confidence))]
}
