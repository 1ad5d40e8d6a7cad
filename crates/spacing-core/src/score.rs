//! Spacing score from the final tracked positions.

use crate::types::TrackedPosition;

/// Fraction of the target distance that still earns a non-zero score.
const TOLERANCE_FRACTION: f64 = 0.5;

/// Score in [0, 100] for how closely the median pairwise distance matches
/// `target_meters * pixels_per_meter`.
///
/// The median (upper median for an even count of pairs) keeps a single
/// spurious extra detection from dominating. Fewer than two positions score 0.
pub fn compute_score(positions: &[TrackedPosition], target_meters: f64, pixels_per_meter: f64) -> u8 {
    if positions.len() < 2 {
        return 0;
    }

    let mut distances = Vec::with_capacity(positions.len() * (positions.len() - 1) / 2);
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            distances.push(a.distance(b));
        }
    }
    distances.sort_by(f64::total_cmp);
    let median = distances[distances.len() / 2];

    let target_px = target_meters * pixels_per_meter;
    let error = (median - target_px).abs();
    let tolerance = target_px * TOLERANCE_FRACTION;
    let tolerance = if tolerance == 0.0 { 1.0 } else { tolerance };

    let normalized = (1.0 - error / tolerance).clamp(0.0, 1.0);
    (normalized * 100.0).round() as u8
}
