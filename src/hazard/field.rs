//! Per-cell hazard cache
//!
//! Most of the grid is lethal to entities that stray from core territory.
//! Each core structure clears a safe radius around itself; everything else
//! is hazardous. Because the rule is radial, recomputing a cell is
//! O(core count) and the cache makes queries O(1).
//!
//! The cache begins all-hazardous and fails safe: out-of-bounds or
//! pre-initialization queries report hazardous.

use crate::core::types::{footprint_center, CellPos, CoreStructure, TerrainKind};
use crate::host::{GridSource, HostEngine};

/// Number of ticks a full-grid recompute is staggered across
pub const UPDATE_DIVISIONS: usize = 1000;

/// Spatial cache of per-cell hazard status
#[derive(Debug, Clone, Default)]
pub struct HazardField {
    width: i32,
    height: i32,
    cache: Vec<bool>,
    /// Terrain as it was before any filler overwrite, for restoration
    original: Vec<TerrainKind>,
    /// Next division of an in-flight full recompute
    cursor: Option<usize>,
}

impl HazardField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the cache all-hazardous and snapshot the original terrain.
    /// Dimensions always equal the grid's from this point on.
    pub fn init(&mut self, host: &dyn HostEngine) {
        let (width, height) = host.dimensions();
        let len = (width as usize) * (height as usize);
        self.width = width;
        self.height = height;
        self.cache = vec![true; len];
        self.original = (0..len)
            .map(|i| {
                let cell = CellPos::new(i as i32 % width, i as i32 / width);
                host.terrain(cell).unwrap_or(TerrainKind::FILLER)
            })
            .collect();
        self.cursor = None;
        tracing::debug!(width, height, "hazard field initialized");
    }

    pub fn is_initialized(&self) -> bool {
        !self.cache.is_empty()
    }

    /// Whether a staggered full recompute is currently in flight
    pub fn is_recomputing(&self) -> bool {
        self.cursor.is_some()
    }

    fn index(&self, cell: CellPos) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        Some((cell.y * self.width + cell.x) as usize)
    }

    /// O(1) hazard lookup. Fails safe: hazardous when out of bounds or
    /// before initialization.
    pub fn query(&self, cell: CellPos) -> bool {
        match self.index(cell) {
            Some(i) if self.is_initialized() => self.cache[i],
            _ => true,
        }
    }

    /// Recompute one cell from the core list: hazardous unless within some
    /// core's safety radius. Always-safe terrain short-circuits. Writes the
    /// cache and requests the matching terrain overwrite or restoration.
    pub fn recompute(
        &mut self,
        cell: CellPos,
        cores: &[CoreStructure],
        host: &mut dyn HostEngine,
    ) -> bool {
        let Some(i) = self.index(cell) else {
            return true;
        };
        if !self.is_initialized() {
            return true;
        }

        let hazardous = if self.original[i].always_safe() {
            false
        } else {
            !cores
                .iter()
                .any(|core| cell.dst2_point(core.center()) < core.tier.safety_radius2())
        };

        self.cache[i] = hazardous;
        let desired = if hazardous { TerrainKind::FILLER } else { self.original[i] };
        if host.terrain(cell) != Some(desired) {
            host.set_terrain(cell, desired);
        }
        hazardous
    }

    /// Recompute a bounding box around `center`. Used after a core is
    /// placed or destroyed.
    pub fn invalidate_region(
        &mut self,
        center: CellPos,
        radius: f32,
        cores: &[CoreStructure],
        host: &mut dyn HostEngine,
    ) {
        if !self.is_initialized() {
            return;
        }
        let min_x = ((center.x as f32 - radius - 1.0).floor() as i32).max(0);
        let min_y = ((center.y as f32 - radius - 1.0).floor() as i32).max(0);
        let max_x = ((center.x as f32 + radius + 1.0).ceil() as i32).min(self.width - 1);
        let max_y = ((center.y as f32 + radius + 1.0).ceil() as i32).min(self.height - 1);
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                self.recompute(CellPos::new(x, y), cores, host);
            }
        }
    }

    /// Begin a full-grid recompute spread across [`UPDATE_DIVISIONS`]
    /// ticks. Re-invocation while one is in flight resets the cursor; there
    /// is never more than one in flight. `query` stays valid throughout,
    /// reading possibly stale values.
    pub fn begin_full_recompute(&mut self) {
        self.cursor = Some(0);
    }

    /// Process one division of the staggered recompute: the modulo-striped
    /// subset of cells for the current cursor. Returns whether more
    /// divisions remain.
    pub fn step_full_recompute(
        &mut self,
        cores: &[CoreStructure],
        host: &mut dyn HostEngine,
    ) -> bool {
        let Some(division) = self.cursor else {
            return false;
        };
        let total = (self.width as usize) * (self.height as usize);
        let mut i = division;
        while i < total {
            let cell = CellPos::new(i as i32 % self.width, i as i32 / self.width);
            self.recompute(cell, cores, host);
            i += UPDATE_DIVISIONS;
        }

        let next = division + 1;
        if next >= UPDATE_DIVISIONS {
            self.cursor = None;
            tracing::debug!("full hazard recompute complete");
        } else {
            self.cursor = Some(next);
        }
        self.cursor.is_some()
    }

    /// Whether any cell covered by a footprint anchored at `pos` is
    /// hazardous. With `hard`, the covered cells are recomputed instead of
    /// read from the cache (used while a staggered recompute is in flight).
    pub fn footprint_hazardous(
        &mut self,
        pos: CellPos,
        size: i32,
        cores: &[CoreStructure],
        host: &mut dyn HostEngine,
        hard: bool,
    ) -> bool {
        let middle = footprint_center(pos, size);
        let diff = (size - 1) as f32 / 2.0;
        let low_x = (middle.x - diff) as i32;
        let low_y = (middle.y - diff) as i32;
        let high_x = (middle.x + diff) as i32;
        let high_y = (middle.y + diff) as i32;
        for x in low_x..=high_x {
            for y in low_y..=high_y {
                let cell = CellPos::new(x, y);
                let hazardous = if hard {
                    self.recompute(cell, cores, host)
                } else {
                    self.query(cell)
                };
                if hazardous {
                    return true;
                }
            }
        }
        false
    }
}
