//! Constrained core placement
//!
//! Starting cores want to sit at the geometric median of their faction's
//! participants, but that point may be on bad terrain, out of bounds, or
//! inside another core's exclusion zone. The solver repels the candidate
//! out of exclusion zones, then scans expanding square rings for the
//! nearest cell where the footprint actually fits.

use ordered_float::OrderedFloat;

use crate::core::config::MatchConfig;
use crate::core::error::{MatchError, Result};
use crate::core::types::{CellPos, CoreStructure, FactionId, Vec2};
use crate::host::GridSource;

/// All 16 cell offsets a size-4 core footprint covers relative to its
/// anchor, ordered so a collision is found as early in the scan as possible
/// (corners first, then edges, interior last).
pub const FOOTPRINT_OFFSETS: [(i32, i32); 16] = [
    (-1, -1),
    (-1, 2),
    (2, -1),
    (2, 2),
    (-1, 0),
    (-1, 1),
    (2, 0),
    (2, 1),
    (0, -1),
    (1, -1),
    (0, 2),
    (1, 2),
    (0, 0),
    (0, 1),
    (1, 0),
    (1, 1),
];

/// Outcome of a placement resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementResolution {
    pub cell: CellPos,
    /// Whether the candidate had to be moved to find a valid cell
    pub adjusted: bool,
}

/// Resolves where a faction's starting core actually goes.
///
/// With `adjust` false the candidate is anchored as-is (`floor(c - 0.5)`).
/// Otherwise the candidate is repelled to exactly the exclusion margin of
/// any core it starts too close to, then square rings of increasing radius
/// are scanned for valid cells. The scan stops at the first ring whose
/// closest valid cell (to the ring center) lies within the ring radius;
/// among all valid cells seen, the one nearest the pre-repulsion candidate
/// wins, ties resolved by the fixed scan order. Exhausting
/// `max_adjust_distance` rings is a hard failure.
pub fn resolve_core_placement(
    candidate: Vec2,
    adjust: bool,
    cores: &[CoreStructure],
    grid: &dyn GridSource,
    config: &MatchConfig,
    faction: FactionId,
) -> Result<PlacementResolution> {
    let mut anchor = CellPos::new(
        (candidate.x - 0.5).round() as i32,
        (candidate.y - 0.5).round() as i32,
    );
    if !adjust {
        return Ok(PlacementResolution { cell: anchor, adjusted: false });
    }
    let pre_repulsion = anchor;

    // Repulsion: leave the exclusion zone of any core we start inside of
    for core in cores {
        let margin = if core.faction.is_defender() {
            config.defender_core_min_distance
        } else {
            config.core_min_distance
        };
        if anchor.dst(core.pos) < 5.0 + margin - config.max_adjust_distance as f32 {
            if anchor == core.pos {
                anchor.x += 1;
            }
            let dx = (anchor.x - core.pos.x) as f32;
            let dy = (anchor.y - core.pos.y) as f32;
            let current = (dx * dx + dy * dy).sqrt();
            let scale = margin / current;
            anchor = CellPos::new(
                (core.pos.x as f32 + scale * dx) as i32,
                (core.pos.y as f32 + scale * dy) as i32,
            );
        }
    }

    let max_radius = config.max_adjust_distance;
    let max_check2 = (max_radius * max_radius) as f32;
    let mut best: Option<(CellPos, OrderedFloat<f32>)> = None;
    let mut closest_to_center2 = f32::MAX;

    let mut radius = 0;
    loop {
        if radius > max_radius {
            tracing::warn!(?faction, max_radius, "core placement search exhausted");
            return Err(MatchError::PlacementUnresolvable { faction, max_radius });
        }

        for (ox, oy) in ring_offsets(radius) {
            if (ox * ox + oy * oy) as f32 > max_check2 {
                continue;
            }
            let sample = CellPos::new(anchor.x + ox, anchor.y + oy);
            if !cell_valid(sample, cores, grid, config) {
                continue;
            }
            closest_to_center2 = closest_to_center2.min(sample.dst2(anchor));
            let key = OrderedFloat(sample.dst2(pre_repulsion));
            if best.map_or(true, |(_, best_key)| key < best_key) {
                best = Some((sample, key));
            }
        }

        if closest_to_center2 <= (radius * radius) as f32 {
            break;
        }
        radius += 1;
    }

    match best {
        Some((cell, _)) => Ok(PlacementResolution { cell, adjusted: radius != 0 }),
        None => Err(MatchError::Internal(
            "ring search terminated without a candidate".into(),
        )),
    }
}

/// Offsets forming the square ring at `radius` (the lone center cell at 0)
fn ring_offsets(radius: i32) -> Vec<(i32, i32)> {
    if radius == 0 {
        return vec![(0, 0)];
    }
    let mut offsets = Vec::with_capacity((radius as usize) * 8);
    for oy in [-radius, radius] {
        for ox in (-radius + 1)..=(radius - 1) {
            offsets.push((ox, oy));
        }
    }
    for ox in [-radius, radius] {
        for oy in -radius..=radius {
            offsets.push((ox, oy));
        }
    }
    offsets
}

/// A cell is valid when every footprint offset is in bounds on placeable
/// terrain and the anchor respects every core's minimum distance.
fn cell_valid(
    sample: CellPos,
    cores: &[CoreStructure],
    grid: &dyn GridSource,
    config: &MatchConfig,
) -> bool {
    for (ox, oy) in FOOTPRINT_OFFSETS {
        let corner = CellPos::new(sample.x + ox, sample.y + oy);
        match grid.terrain(corner) {
            Some(terrain) if terrain.placeable() => {}
            _ => return false,
        }
    }

    let min2 = config.core_min_distance * config.core_min_distance;
    let defender_min2 = config.defender_core_min_distance * config.defender_core_min_distance;
    for core in cores {
        let d2 = sample.dst2(core.pos);
        if d2 < min2 {
            return false;
        }
        if core.faction.is_defender() && d2 < defender_min2 {
            return false;
        }
    }
    true
}
