//! Host engine contract
//!
//! The hosting game engine (rendering, physics, construction mechanics,
//! pathing, combat, transport) is an external collaborator. This module
//! pins down exactly what the simulation core needs from it: grid queries,
//! terrain writes, structure and entity bookkeeping, and messaging.
//!
//! All calls are synchronous; the host invokes the core's entry points
//! between ticks and the core calls back through this trait during them.

use crate::core::types::{
    CellPos, CoreTier, EntityId, FactionId, ParticipantToken, StructureId, TerrainKind, Vec2,
};
use crate::resources::ResourceBundle;

/// What a placed structure is, as far as the simulation core cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureKind {
    /// A territory-anchoring core
    Core(CoreTier),
    /// A storage depot, convertible into a core
    Depot,
    /// A weapon emplacement (banned inside the active sanctuary for Defenders)
    Turret,
    /// Anything else
    Other,
}

impl StructureKind {
    pub fn footprint(self) -> i32 {
        match self {
            StructureKind::Core(tier) => tier.footprint(),
            StructureKind::Depot => 3,
            StructureKind::Turret => 2,
            StructureKind::Other => 1,
        }
    }
}

/// Snapshot of a placed structure, reported by the host
#[derive(Debug, Clone)]
pub struct StructureView {
    pub id: StructureId,
    pub faction: FactionId,
    pub pos: CellPos,
    pub kind: StructureKind,
    pub health: f32,
    pub max_health: f32,
    /// Stored items, populated for depots
    pub contents: ResourceBundle,
}

/// Snapshot of a mobile entity, reported by the host
#[derive(Debug, Clone, Copy)]
pub struct EntityView {
    pub id: EntityId,
    pub faction: FactionId,
    pub cell: CellPos,
    pub health: f32,
    pub max_health: f32,
    /// Courier-class entities are immune to hazard damage
    pub hazard_immune: bool,
}

/// Read-only grid queries. Split out so the placement solver and tests can
/// depend on just the grid.
pub trait GridSource {
    /// Grid dimensions in cells (width, height)
    fn dimensions(&self) -> (i32, i32);

    /// Terrain of a cell; `None` out of bounds
    fn terrain(&self, cell: CellPos) -> Option<TerrainKind>;
}

/// The services the hosting engine provides to the simulation core
pub trait HostEngine: GridSource {
    /// Overwrite the terrain of a cell (hazard filler or restoration)
    fn set_terrain(&mut self, cell: CellPos, kind: TerrainKind);

    /// Commit a core structure to the world, returning its id
    fn place_core(&mut self, cell: CellPos, tier: CoreTier, faction: FactionId) -> StructureId;

    /// Remove a structure from the world without collateral damage
    fn remove_structure(&mut self, id: StructureId);

    /// All placed structures
    fn structures(&self) -> Vec<StructureView>;

    /// Override a structure's current health
    fn set_structure_health(&mut self, id: StructureId, health: f32);

    /// All mobile entities
    fn entities(&self) -> Vec<EntityView>;

    /// Override an entity's current and maximum health
    fn set_entity_health(&mut self, id: EntityId, health: f32, max_health: f32);

    /// Destroy a mobile entity
    fn destroy_entity(&mut self, id: EntityId);

    /// Restore an entity's full damage susceptibility
    fn restore_entity_vulnerability(&mut self, id: EntityId);

    /// Current position of a participant's avatar, if they are in the world
    fn participant_position(&self, token: ParticipantToken) -> Option<Vec2>;

    /// Assign a participant to an engine-level team
    fn assign_participant(&mut self, token: ParticipantToken, engine_team: u32);

    /// Message every connected participant
    fn broadcast(&mut self, message: &str);

    /// Message one participant
    fn notify_participant(&mut self, token: ParticipantToken, message: &str);
}
