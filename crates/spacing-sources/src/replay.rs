//! Newline-delimited JSON detection frames.
//!
//! Lets an out-of-process detector (or a recorded session) feed the tracker.
//! Each line is one frame, tagged by detector kind:
//!
//! ```text
//! {"kind":"pose","landmarks":[{"x":0.5,"y":0.3,"visibility":0.9}]}
//! {"kind":"face","detections":[{"box":{"x_center":0.4,"y_center":0.5,"width":0.1,"height":0.1}}]}
//! {"kind":"head","frame_width":640,"frame_height":480,"boxes":[{"x":300,"y":200,"width":40,"height":60}]}
//! {"kind":"points","points":[{"x":350.0,"y":300.0}]}
//! ```
//!
//! A blank line is a frame with no detections.

use crate::face::{points_from_faces, FaceDetection};
use crate::head::{points_from_heads, PixelBox};
use crate::pose::{points_from_landmarks, Landmark};
use crate::viewport::Viewport;
use crate::{DetectionSource, SourceError};
use serde::Deserialize;
use spacing_core::Point;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One decoded detection frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionFrame {
    Pose {
        landmarks: Vec<Landmark>,
    },
    Face {
        detections: Vec<FaceDetection>,
    },
    Head {
        frame_width: f64,
        frame_height: f64,
        boxes: Vec<PixelBox>,
    },
    /// Points already in canvas space.
    Points {
        points: Vec<Point>,
    },
}

impl DetectionFrame {
    pub fn to_points(&self, viewport: &Viewport, max_people: usize) -> Vec<Point> {
        match self {
            DetectionFrame::Pose { landmarks } => points_from_landmarks(landmarks, viewport),
            DetectionFrame::Face { detections } => {
                points_from_faces(detections, viewport, max_people)
            }
            DetectionFrame::Head {
                frame_width,
                frame_height,
                boxes,
            } => points_from_heads(boxes, *frame_width, *frame_height, viewport, max_people),
            DetectionFrame::Points { points } => points
                .iter()
                .filter(|p| p.x.is_finite() && p.y.is_finite())
                .take(max_people)
                .map(|&p| viewport.clamp_point(p))
                .collect(),
        }
    }
}

/// Reads one frame per line from any buffered reader.
pub struct ReplaySource<R> {
    reader: R,
    viewport: Viewport,
    max_people: usize,
    line_no: usize,
    buf: String,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path, viewport: Viewport, max_people: usize) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        tracing::info!(path = %path.display(), "replay source opened");
        Ok(Self::new(BufReader::new(file), viewport, max_people))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R, viewport: Viewport, max_people: usize) -> Self {
        Self {
            reader,
            viewport,
            max_people,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead + Send> DetectionSource for ReplaySource<R> {
    fn name(&self) -> &str {
        "replay"
    }

    fn next_points(&mut self) -> Result<Option<Vec<Point>>, SourceError> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        let line = self.buf.trim();
        if line.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let frame: DetectionFrame =
            serde_json::from_str(line).map_err(|source| SourceError::Malformed {
                line: self.line_no,
                source,
            })?;
        Ok(Some(frame.to_points(&self.viewport, self.max_people)))
    }
}
