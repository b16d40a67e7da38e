//! In-memory reference host
//!
//! A minimal [`HostEngine`] implementation backed by plain maps. Used by the
//! test suites and the `skirmish` demo binary; real deployments implement
//! the trait over the actual game engine.

use ahash::AHashMap;

use crate::core::types::{
    CellPos, CoreTier, EntityId, FactionId, ParticipantToken, StructureId, TerrainKind, Vec2,
};
use crate::host::{EntityView, GridSource, HostEngine, StructureKind, StructureView};
use crate::resources::ResourceBundle;

/// Host engine stand-in holding the whole world in memory
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    width: i32,
    height: i32,
    terrain: Vec<TerrainKind>,
    next_structure_id: u64,
    pub structures: AHashMap<StructureId, StructureView>,
    pub entities: AHashMap<EntityId, EntityView>,
    pub positions: AHashMap<ParticipantToken, Vec2>,
    pub assignments: AHashMap<ParticipantToken, u32>,
    pub broadcasts: Vec<String>,
    pub notifications: Vec<(ParticipantToken, String)>,
    pub removed_structures: Vec<StructureId>,
    pub destroyed_entities: Vec<EntityId>,
    pub revulnerable_entities: Vec<EntityId>,
}

impl MockHost {
    /// A grid filled with a single terrain kind
    pub fn uniform(width: i32, height: i32, kind: TerrainKind) -> Self {
        Self {
            width,
            height,
            terrain: vec![kind; (width as usize) * (height as usize)],
            next_structure_id: 1,
            ..Self::default()
        }
    }

    fn index(&self, cell: CellPos) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        Some((cell.y * self.width + cell.x) as usize)
    }

    fn allocate_id(&mut self) -> StructureId {
        let id = StructureId(self.next_structure_id);
        self.next_structure_id += 1;
        id
    }

    /// Place a non-core structure directly (test scaffolding)
    pub fn spawn_structure(
        &mut self,
        faction: FactionId,
        pos: CellPos,
        kind: StructureKind,
        max_health: f32,
    ) -> StructureId {
        let id = self.allocate_id();
        self.structures.insert(
            id,
            StructureView {
                id,
                faction,
                pos,
                kind,
                health: max_health,
                max_health,
                contents: ResourceBundle::new(),
            },
        );
        id
    }

    /// Place a depot holding the given contents
    pub fn spawn_depot(
        &mut self,
        faction: FactionId,
        pos: CellPos,
        contents: ResourceBundle,
    ) -> StructureId {
        let id = self.spawn_structure(faction, pos, StructureKind::Depot, 600.0);
        if let Some(depot) = self.structures.get_mut(&id) {
            depot.contents = contents;
        }
        id
    }

    /// Spawn a mobile entity (test scaffolding)
    pub fn spawn_entity(
        &mut self,
        id: EntityId,
        faction: FactionId,
        cell: CellPos,
        max_health: f32,
        hazard_immune: bool,
    ) -> EntityView {
        let view = EntityView {
            id,
            faction,
            cell,
            health: max_health,
            max_health,
            hazard_immune,
        };
        self.entities.insert(id, view);
        view
    }

    pub fn structure(&self, id: StructureId) -> Option<&StructureView> {
        self.structures.get(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityView> {
        self.entities.get(&id)
    }
}

impl GridSource for MockHost {
    fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn terrain(&self, cell: CellPos) -> Option<TerrainKind> {
        self.index(cell).map(|i| self.terrain[i])
    }
}

impl HostEngine for MockHost {
    fn set_terrain(&mut self, cell: CellPos, kind: TerrainKind) {
        if let Some(i) = self.index(cell) {
            self.terrain[i] = kind;
        }
    }

    fn place_core(&mut self, cell: CellPos, tier: CoreTier, faction: FactionId) -> StructureId {
        let id = self.allocate_id();
        self.structures.insert(
            id,
            StructureView {
                id,
                faction,
                pos: cell,
                kind: StructureKind::Core(tier),
                health: 4000.0,
                max_health: 4000.0,
                contents: ResourceBundle::new(),
            },
        );
        id
    }

    fn remove_structure(&mut self, id: StructureId) {
        self.structures.remove(&id);
        self.removed_structures.push(id);
    }

    fn structures(&self) -> Vec<StructureView> {
        let mut all: Vec<StructureView> = self.structures.values().cloned().collect();
        all.sort_by_key(|s| s.id);
        all
    }

    fn set_structure_health(&mut self, id: StructureId, health: f32) {
        if let Some(structure) = self.structures.get_mut(&id) {
            structure.health = health;
        }
    }

    fn entities(&self) -> Vec<EntityView> {
        let mut all: Vec<EntityView> = self.entities.values().copied().collect();
        all.sort_by_key(|e| e.id);
        all
    }

    fn set_entity_health(&mut self, id: EntityId, health: f32, max_health: f32) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.health = health;
            entity.max_health = max_health;
        }
    }

    fn destroy_entity(&mut self, id: EntityId) {
        self.entities.remove(&id);
        self.destroyed_entities.push(id);
    }

    fn restore_entity_vulnerability(&mut self, id: EntityId) {
        self.revulnerable_entities.push(id);
    }

    fn participant_position(&self, token: ParticipantToken) -> Option<Vec2> {
        self.positions.get(&token).copied()
    }

    fn assign_participant(&mut self, token: ParticipantToken, engine_team: u32) {
        self.assignments.insert(token, engine_team);
    }

    fn broadcast(&mut self, message: &str) {
        self.broadcasts.push(message.to_string());
    }

    fn notify_participant(&mut self, token: ParticipantToken, message: &str) {
        self.notifications.push((token, message.to_string()));
    }
}
