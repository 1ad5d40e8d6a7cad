//! Pixel-space head/face boxes from the last-resort detector → box centres.

use crate::viewport::Viewport;
use serde::Deserialize;
use spacing_core::Point;

/// Head box in source-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PixelBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub score: Option<f32>,
}

/// Box centres for the first `max_people` boxes of a `frame_width × frame_height` frame.
///
/// A degenerate frame size yields no points.
pub fn points_from_heads(
    boxes: &[PixelBox],
    frame_width: f64,
    frame_height: f64,
    viewport: &Viewport,
    max_people: usize,
) -> Vec<Point> {
    boxes
        .iter()
        .take(max_people)
        .filter_map(|b| {
            viewport.map_pixels(
                b.x + b.width / 2.0,
                b.y + b.height / 2.0,
                frame_width,
                frame_height,
                b.score,
            )
        })
        .collect()
}
