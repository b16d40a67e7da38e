//! Geometric median by pattern search
//!
//! The exact geometric median has no closed form past three points, but the
//! candidate sets here are a handful of participant positions, so an
//! iterative probe search converges in a few dozen rounds.

use crate::core::error::{MatchError, Result};
use crate::core::types::Vec2;

/// Finds the point with the least total distance to all given points,
/// accurate to within `precision`.
///
/// Starts at the arithmetic mean with a step equal to the farthest
/// mean-to-point distance. Each round evaluates the center and four
/// diagonal probes at the current step; when the center wins, the step is
/// halved, terminating once it falls to `precision`. Otherwise the search
/// recenters on the winning probe.
///
/// Zero points is an error. One point is its own median; two points have
/// the exact arithmetic mean as theirs.
pub fn geometric_median(points: &[Vec2], precision: f32) -> Result<Vec2> {
    if points.is_empty() {
        return Err(MatchError::EmptyPointSet);
    }
    if points.len() == 1 {
        return Ok(points[0]);
    }

    let inverse_count = 1.0 / points.len() as f32;
    let mean = points
        .iter()
        .fold(Vec2::default(), |acc, p| acc + *p)
        * inverse_count;
    if points.len() == 2 {
        return Ok(mean);
    }

    let mut center = mean;
    let mut step = points
        .iter()
        .map(|p| p.distance(&mean))
        .fold(f32::MIN_POSITIVE, f32::max);

    loop {
        let probes = [
            Vec2::new(0.0, 0.0),
            Vec2::new(-step, -step),
            Vec2::new(-step, step),
            Vec2::new(step, -step),
            Vec2::new(step, step),
        ];

        let mut best_index = 0;
        let mut best_total = f64::MAX;
        for (i, offset) in probes.iter().enumerate() {
            let sample = center + *offset;
            let total: f64 = points.iter().map(|p| p.distance(&sample) as f64).sum();
            // Small bias so probes must strictly beat the center
            if total < best_total - 1e-11 {
                best_total = total;
                best_index = i;
            }
        }

        if best_index == 0 {
            if step <= precision {
                return Ok(center);
            }
            step /= 2.0;
        } else {
            center = center + probes[best_index];
        }
    }
}

/// Total distance from `point` to every entry of `points`
pub fn total_distance(point: Vec2, points: &[Vec2]) -> f64 {
    points.iter().map(|p| p.distance(&point) as f64).sum()
}
