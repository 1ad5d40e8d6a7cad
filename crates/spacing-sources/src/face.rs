//! Multi-face detections with relative bounding boxes → one point per face.

use crate::viewport::Viewport;
use serde::Deserialize;
use spacing_core::Point;

/// Relative (0–1) face box. Detectors report either a centre or a top-left
/// corner; the centre wins when both are present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct RelativeBox {
    #[serde(default)]
    pub x_center: Option<f64>,
    #[serde(default)]
    pub y_center: Option<f64>,
    #[serde(default)]
    pub x_min: Option<f64>,
    #[serde(default)]
    pub y_min: Option<f64>,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl RelativeBox {
    pub fn center(&self) -> (f64, f64) {
        let cx = self
            .x_center
            .unwrap_or_else(|| self.x_min.unwrap_or(0.0) + self.width / 2.0);
        let cy = self
            .y_center
            .unwrap_or_else(|| self.y_min.unwrap_or(0.0) + self.height / 2.0);
        (cx, cy)
    }
}

/// One face detection.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FaceDetection {
    #[serde(rename = "box")]
    pub bbox: RelativeBox,
    #[serde(default)]
    pub score: Option<f32>,
}

/// Face centres for the first `max_people` detections.
pub fn points_from_faces(
    detections: &[FaceDetection],
    viewport: &Viewport,
    max_people: usize,
) -> Vec<Point> {
    detections
        .iter()
        .take(max_people)
        .map(|d| {
            let (cx, cy) = d.bbox.center();
            viewport.map_normalized(cx, cy, Some(d.score.unwrap_or(1.0)))
        })
        .collect()
}
