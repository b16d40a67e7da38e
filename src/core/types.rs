//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Integer grid coordinate (one cell of the match grid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
}

impl CellPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to another cell
    pub fn dst2(&self, other: CellPos) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        dx * dx + dy * dy
    }

    /// Squared euclidean distance to a continuous point
    pub fn dst2_point(&self, point: Vec2) -> f32 {
        let dx = self.x as f32 - point.x;
        let dy = self.y as f32 - point.y;
        dx * dx + dy * dy
    }

    pub fn dst(&self, other: CellPos) -> f32 {
        self.dst2(other).sqrt()
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

/// 2D position in continuous grid space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Manhattan distance to another point
    pub fn manhattan(&self, other: &Self) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

/// Unique identifier for a faction
///
/// Attacker factions receive the smallest unused positive id at formation.
/// Id 0 is reserved for the single Defender faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl FactionId {
    pub const DEFENDER: FactionId = FactionId(0);

    pub fn is_defender(self) -> bool {
        self == Self::DEFENDER
    }
}

/// Stable participant identity token, supplied by the host engine.
/// Survives reconnects for the whole process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantToken(pub u64);

/// Host-assigned identifier for a placed structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StructureId(pub u64);

/// Host-assigned identifier for a mobile entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Rank of a territory-anchoring core structure.
/// Higher tiers carve a strictly larger safe radius out of the hazard field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoreTier {
    Outpost,
    Bastion,
    Citadel,
}

impl CoreTier {
    /// Radius (in cells) that a core of this tier clears around itself
    pub fn safety_radius(self) -> f32 {
        match self {
            CoreTier::Outpost => 30.0,
            CoreTier::Bastion => 40.0,
            CoreTier::Citadel => 50.0,
        }
    }

    pub fn safety_radius2(self) -> f32 {
        let r = self.safety_radius();
        r * r
    }

    /// Footprint edge length in cells
    pub fn footprint(self) -> i32 {
        match self {
            CoreTier::Outpost => 3,
            CoreTier::Bastion => 4,
            CoreTier::Citadel => 5,
        }
    }
}

/// A placed core structure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreStructure {
    pub id: StructureId,
    pub tier: CoreTier,
    pub pos: CellPos,
    pub faction: FactionId,
}

impl CoreStructure {
    /// Geometric center of the footprint. Even-sized footprints sit between
    /// cells, so their center is offset by +0.5 from the anchor cell.
    pub fn center(&self) -> Vec2 {
        footprint_center(self.pos, self.tier.footprint())
    }
}

/// Geometric center of an arbitrary footprint anchored at `pos`
pub fn footprint_center(pos: CellPos, size: i32) -> Vec2 {
    let mut center = pos.as_vec2();
    if size % 2 == 0 {
        center.x += 0.5;
        center.y += 0.5;
    }
    center
}

/// Terrain classification of a cell, snapshotted by the hazard field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Ordinary buildable ground
    Rock,
    /// Ordinary buildable ground
    Gravel,
    /// Guaranteed-safe ground: never hazardous, but cores may not anchor here
    Meadow,
    /// Molten ground, not placeable
    Slag,
    /// Deep water, not placeable
    Basin,
    /// Filler terrain written over hazardous cells
    Ember,
}

impl TerrainKind {
    /// Terrain written over cells while they are hazardous
    pub const FILLER: TerrainKind = TerrainKind::Ember;

    /// Whether structures can be placed on this terrain
    pub fn placeable(self) -> bool {
        !matches!(self, TerrainKind::Slag | TerrainKind::Basin)
    }

    /// Always-safe terrain short-circuits hazard computation
    pub fn always_safe(self) -> bool {
        matches!(self, TerrainKind::Meadow)
    }
}

/// Kind of faction in the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactionKind {
    /// The single central team
    Defender,
    /// A dynamically formed outer team
    Attacker,
    /// Undecided participants during setup
    Neutral,
}

/// Match lifecycle phase. Transitions are one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Setup,
    Placement,
    Active,
    Over,
}

/// A queued action that fires on the participant's next click, then clears
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickAction {
    /// Destroy the clicked structure if it belongs to the clicker's faction
    Demolish,
    /// Decommission a clicked own core without collateral damage
    RemoveCore,
}

/// Match clock. The start instant is offset forward by the total setup
/// duration, so elapsed time is negative while setup is still running.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchClock {
    pub start_ms: i64,
}

impl MatchClock {
    pub fn new(now_ms: i64, setup_duration_s: i64) -> Self {
        Self { start_ms: now_ms + setup_duration_s * 1000 }
    }

    /// Seconds since the scheduled match start. Negative during setup.
    pub fn elapsed_s(&self, now_ms: i64) -> i64 {
        (now_ms - self.start_ms) / 1000
    }
}
