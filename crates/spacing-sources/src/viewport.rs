//! Camera viewport on the game canvas. Maps detector coordinates into
//! canvas pixels and clamps them inside the camera rectangle.

use serde::{Deserialize, Serialize};
use spacing_core::Point;

const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;
const DEFAULT_CAMERA_SCALE: f64 = 0.5;

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (
            clamp_or_low(x, self.x, self.x + self.width),
            clamp_or_low(y, self.y, self.y + self.height),
        )
    }
}

/// Canvas size and the scale at which the camera feed is drawn, centred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub camera_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            camera_scale: DEFAULT_CAMERA_SCALE,
        }
    }
}

impl Viewport {
    /// Rectangle the camera feed occupies on the canvas.
    pub fn camera_rect(&self) -> Rect {
        let width = self.canvas_width * self.camera_scale;
        let height = self.canvas_height * self.camera_scale;
        Rect {
            x: (self.canvas_width - width) / 2.0,
            y: (self.canvas_height - height) / 2.0,
            width,
            height,
        }
    }

    /// Map normalized [0, 1] image coordinates; out-of-range input is clamped.
    pub fn map_normalized(&self, nx: f64, ny: f64, confidence: Option<f32>) -> Point {
        let rect = self.camera_rect();
        let x = rect.x + clamp_unit(nx) * rect.width;
        let y = rect.y + clamp_unit(ny) * rect.height;
        Point { x, y, confidence }
    }

    /// Clamp a canvas-space point into the camera rectangle.
    pub fn clamp_point(&self, point: Point) -> Point {
        let (x, y) = self.camera_rect().clamp(point.x, point.y);
        Point { x, y, ..point }
    }

    /// Map pixel coordinates in a `frame_width × frame_height` image.
    ///
    /// Returns `None` for a degenerate frame size.
    pub fn map_pixels(
        &self,
        px: f64,
        py: f64,
        frame_width: f64,
        frame_height: f64,
        confidence: Option<f32>,
    ) -> Option<Point> {
        if !(frame_width > 0.0 && frame_height > 0.0) {
            return None;
        }
        let rect = self.camera_rect();
        let (x, y) = rect.clamp(
            rect.x + px * (rect.width / frame_width),
            rect.y + py * (rect.height / frame_height),
        );
        Some(Point { x, y, confidence })
    }
}

/// Clamp to [0, 1], treating NaN as 0.
fn clamp_unit(v: f64) -> f64 {
    clamp_or_low(v, 0.0, 1.0)
}

fn clamp_or_low(v: f64, low: f64, high: f64) -> f64 {
    if v.is_nan() {
        low
    } else {
        v.clamp(low, high)
    }
}
