//! Multi-person track registry.
//!
//! Nearest-neighbour association with EMA smoothing, timeout expiry and a
//! population cap. Points are matched progressively: each point in a batch
//! sees the tracks as already updated (or created) by earlier points of the
//! same batch, so two points may continue the same track.

use crate::config::GameConfig;
use crate::types::{Point, TrackedPosition};
use std::time::{Duration, Instant};

/// A persistent identity for one detected person.
#[derive(Debug, Clone)]
struct Track {
    id: u64,
    x: f64,
    y: f64,
    last_seen: Instant,
}

/// Association parameters, copied out of [`GameConfig`].
#[derive(Debug, Clone, Copy)]
pub struct TrackerParams {
    pub match_radius_px: f64,
    pub ema_alpha: f64,
    pub track_timeout: Duration,
    pub max_tracks: usize,
}

impl From<&GameConfig> for TrackerParams {
    fn from(config: &GameConfig) -> Self {
        Self {
            match_radius_px: config.match_radius_px,
            ema_alpha: config.ema_alpha,
            track_timeout: config.track_timeout(),
            max_tracks: config.max_tracks,
        }
    }
}

/// Owns every live track. Never fails; only grows and shrinks.
#[derive(Debug)]
pub struct TrackRegistry {
    params: TrackerParams,
    /// Ordered most recently seen first after every expiry pass.
    tracks: Vec<Track>,
    next_id: u64,
}

impl TrackRegistry {
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            tracks: Vec::with_capacity(params.max_tracks + 1),
            next_id: 1,
        }
    }

    /// Associate a frame's points with tracks, then expire and cap.
    ///
    /// An empty slice only runs expiry.
    pub fn ingest(&mut self, points: &[Point], now: Instant) {
        let alpha = self.params.ema_alpha;

        for point in points {
            match self.nearest(point) {
                Some((idx, dist)) if dist <= self.params.match_radius_px => {
                    let track = &mut self.tracks[idx];
                    track.x = track.x * (1.0 - alpha) + point.x * alpha;
                    track.y = track.y * (1.0 - alpha) + point.y * alpha;
                    track.last_seen = now;
                }
                _ => {
                    let id = self.next_id;
                    self.next_id += 1;
                    tracing::debug!(id, x = point.x, y = point.y, "new track");
                    self.tracks.push(Track {
                        id,
                        x: point.x,
                        y: point.y,
                        last_seen: now,
                    });
                }
            }
        }

        self.expire_and_cap(now);
    }

    /// Drop tracks unseen for at least the timeout, then keep only the
    /// `max_tracks` most recently seen.
    pub fn expire_and_cap(&mut self, now: Instant) {
        let timeout = self.params.track_timeout;
        let before = self.tracks.len();

        self.tracks
            .retain(|t| now.saturating_duration_since(t.last_seen) < timeout);
        // Stable sort: equal timestamps keep registry order.
        self.tracks.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        self.tracks.truncate(self.params.max_tracks);

        let dropped = before - self.tracks.len();
        if dropped > 0 {
            tracing::debug!(dropped, remaining = self.tracks.len(), "tracks expired or capped");
        }
    }

    /// Snapshot of live tracks, most recently seen first.
    pub fn current_positions(&self) -> Vec<TrackedPosition> {
        self.tracks
            .iter()
            .map(|t| TrackedPosition {
                id: t.id,
                x: t.x,
                y: t.y,
            })
            .collect()
    }

    /// Remove every track. The ID counter is kept so IDs are never reused.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Move every track's `last_seen` later by `delta`, so time spent paused
    /// does not count toward expiry.
    pub fn shift_last_seen(&mut self, delta: Duration) {
        for track in &mut self.tracks {
            track.last_seen += delta;
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Index and distance of the closest track; ties keep the earliest.
    fn nearest(&self, point: &Point) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, track) in self.tracks.iter().enumerate() {
            let dist = (track.x - point.x).hypot(track.y - point.y);
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
        best
    }
}
