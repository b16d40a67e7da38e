//! Per-entity and per-structure health overrides
//!
//! Two concerns meet here: hazard damage for mobile entities standing on
//! hazardous cells, and sanctuary invulnerability for Defender structures.
//! The mediator owns the record of every entity's true maximum health so it
//! can clamp regeneration inside the hazard and restore the real value on
//! exit.
//!
//! Damage is scaled by real elapsed time rather than tick count, so a
//! stalling host does not forgive accumulated damage.

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::core::config::MatchConfig;
use crate::core::types::{EntityId, StructureId};
use crate::hazard::HazardField;
use crate::host::HostEngine;
use crate::sanctuary::SanctuaryRegion;

/// Nominal simulation rate the per-tick damage constants are tuned for
const TICKS_PER_SECOND: f32 = 60.0;

#[derive(Debug, Clone, Copy)]
struct TrackedEntity {
    true_max_health: f32,
    in_hazard: bool,
}

#[derive(Debug, Default)]
pub struct EntityHealthMediator {
    tracked: AHashMap<EntityId, TrackedEntity>,
    /// Defender structures currently holding sanctuary protection
    protected: AHashSet<StructureId>,
    sanctuary_was_active: bool,
    last_tick_ms: Option<i64>,
}

impl EntityHealthMediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly created entity so its true maximum health is on
    /// record before any hazard clamping touches it.
    pub fn entity_created(&mut self, id: EntityId, max_health: f32) {
        self.tracked.insert(
            id,
            TrackedEntity {
                true_max_health: max_health,
                in_hazard: false,
            },
        );
    }

    pub fn entity_destroyed(&mut self, id: EntityId) {
        self.tracked.remove(&id);
    }

    /// One mediation pass: hazard damage and regeneration clamping for
    /// mobile entities, then sanctuary protection for Defender structures.
    pub fn tick(
        &mut self,
        host: &mut dyn HostEngine,
        hazard: &HazardField,
        sanctuary: &SanctuaryRegion,
        sanctuary_active: bool,
        config: &MatchConfig,
        now_ms: i64,
    ) {
        let elapsed_ticks = match self.last_tick_ms {
            Some(last) => (now_ms - last).max(0) as f32 / 1_000.0 * TICKS_PER_SECOND,
            None => 0.0,
        };
        self.last_tick_ms = Some(now_ms);

        self.mediate_entities(host, hazard, config, elapsed_ticks);
        self.mediate_sanctuary(host, sanctuary, sanctuary_active);
    }

    fn mediate_entities(
        &mut self,
        host: &mut dyn HostEngine,
        hazard: &HazardField,
        config: &MatchConfig,
        elapsed_ticks: f32,
    ) {
        for entity in host.entities() {
            if entity.hazard_immune {
                continue;
            }
            let record = self
                .tracked
                .entry(entity.id)
                .or_insert(TrackedEntity {
                    true_max_health: entity.max_health,
                    in_hazard: false,
                });

            if hazard.query(entity.cell) {
                let damage = (config.hazard_damage_flat
                    + record.true_max_health * config.hazard_damage_percent)
                    * elapsed_ticks;
                let health = entity.health - damage;
                if health <= 0.0 {
                    debug!(entity = entity.id.0, "entity lost to hazard");
                    host.destroy_entity(entity.id);
                    self.tracked.remove(&entity.id);
                    continue;
                }
                // Max health rides current health inside the hazard, which
                // blocks regeneration from outpacing the field
                host.set_entity_health(entity.id, health, health);
                record.in_hazard = true;
            } else if record.in_hazard {
                record.in_hazard = false;
                host.set_entity_health(entity.id, entity.health, record.true_max_health);
            }
        }
    }

    fn mediate_sanctuary(
        &mut self,
        host: &mut dyn HostEngine,
        sanctuary: &SanctuaryRegion,
        active: bool,
    ) {
        if active {
            for structure in host.structures() {
                if !structure.faction.is_defender() {
                    continue;
                }
                if sanctuary.contains_footprint(structure.pos, structure.kind.footprint()) {
                    host.set_structure_health(structure.id, f32::MAX);
                    self.protected.insert(structure.id);
                }
            }
        } else if self.sanctuary_was_active {
            // Active -> inactive: hand every protected structure its
            // standard health back and make Defender entities mortal again
            for structure in host.structures() {
                if self.protected.contains(&structure.id) {
                    host.set_structure_health(structure.id, structure.max_health);
                }
            }
            self.protected.clear();
            for entity in host.entities() {
                if entity.faction.is_defender() {
                    host.restore_entity_vulnerability(entity.id);
                }
            }
        }
        self.sanctuary_was_active = active;
    }

    /// True maximum health on record for an entity, if tracked.
    #[cfg(test)]
    fn true_max_health(&self, id: EntityId) -> Option<f32> {
        self.tracked.get(&id).map(|t| t.true_max_health)
    }
}
