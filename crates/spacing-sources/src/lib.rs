//! spacing-sources — Detection source adapters.
//!
//! Each adapter turns one detector's per-frame output into canvas-space
//! [`Point`]s, clamped into the camera viewport. The tracker never sees
//! which detector produced a point.

pub mod face;
pub mod head;
pub mod pose;
pub mod replay;
pub mod simulated;
pub mod viewport;

pub use replay::ReplaySource;
pub use simulated::SimulatedSource;
pub use viewport::Viewport;

use spacing_core::Point;
use thiserror::Error;

/// Default per-frame detection cap, matching the tracker's population cap.
pub const DEFAULT_MAX_PEOPLE: usize = 6;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed detection frame on line {line}: {source}")]
    Malformed {
        line: usize,
        source: serde_json::Error,
    },
}

/// A producer of per-frame detection points.
pub trait DetectionSource: Send {
    /// Short name for logs and status output.
    fn name(&self) -> &str;

    /// Points for the next frame. `Ok(None)` means the source is exhausted;
    /// an empty vector means nothing was detected this frame.
    fn next_points(&mut self) -> Result<Option<Vec<Point>>, SourceError>;
}
