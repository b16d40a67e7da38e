//! Central sanctuary region
//!
//! A fixed Manhattan-distance diamond around the grid center. While active
//! it grants Defender structures inside it unbounded health; the mediator
//! applies and removes that protection on the activity transitions.

use crate::core::config::MatchConfig;
use crate::core::types::{CellPos, MatchClock};

#[derive(Debug, Clone, Copy)]
pub struct SanctuaryRegion {
    center: CellPos,
    radius: i32,
    guaranteed_until_s: i64,
}

impl SanctuaryRegion {
    pub fn new(width: i32, height: i32, config: &MatchConfig) -> Self {
        Self {
            center: CellPos::new((width - 1) / 2, (height - 1) / 2),
            radius: config.sanctuary_radius,
            guaranteed_until_s: config.guaranteed_sanctuary_s,
        }
    }

    pub fn center(&self) -> CellPos {
        self.center
    }

    /// Active while more than one Attacker faction survives, or
    /// unconditionally during the guaranteed opening window.
    pub fn is_active(&self, attacker_count: usize, clock: MatchClock, now_ms: i64) -> bool {
        attacker_count > 1 || clock.elapsed_s(now_ms) < self.guaranteed_until_s
    }

    pub fn contains_cell(&self, cell: CellPos) -> bool {
        (cell.x - self.center.x).abs() + (cell.y - self.center.y).abs() <= self.radius
    }

    /// True when every corner of a `size × size` footprint centered on
    /// `pos` lies inside the region.
    pub fn contains_footprint(&self, pos: CellPos, size: i32) -> bool {
        let low_x = pos.x - (size - 1) / 2;
        let low_y = pos.y - (size - 1) / 2;
        let high_x = low_x + size - 1;
        let high_y = low_y + size - 1;
        self.contains_cell(CellPos::new(low_x, low_y))
            && self.contains_cell(CellPos::new(high_x, low_y))
            && self.contains_cell(CellPos::new(low_x, high_y))
            && self.contains_cell(CellPos::new(high_x, high_y))
    }
}
