//! Phase-driven match scheduler
//!
//! Owns the authoritative simulation state and composes every other
//! component: the hazard field, the placement solver, pricing, factions,
//! the sanctuary, and the health mediator. One `tick` call per match tick,
//! strict order: time bookkeeping, one slice of the staggered hazard
//! recompute, entity mediation, then the phase step.
//!
//! A fault inside a tick is caught at the top, dumped as a structured
//! diagnostic, and the match carries on next tick. Per-faction work during
//! phase transitions iterates defensive snapshots so one faction's
//! disqualification never aborts the others.

use ahash::AHashMap;
use serde_json::json;
use tracing::{error, info, warn};

use crate::core::config::MatchConfig;
use crate::core::error::{MatchError, Result, ValidationFailure};
use crate::core::types::{
    CellPos, ClickAction, CoreStructure, CoreTier, EntityId, FactionId, MatchClock, MatchPhase,
    ParticipantToken, StructureId, Vec2,
};
use crate::faction::{Ballot, FactionEvent, FactionRegistry, ParticipantRegistry};
use crate::hazard::HazardField;
use crate::host::{GridSource, HostEngine, StructureKind, StructureView};
use crate::mediator::EntityHealthMediator;
use crate::placement::{geometric_median, resolve_core_placement};
use crate::pricing::{commit_core, quote_core};
use crate::resources::ResourceBundle;
use crate::sanctuary::SanctuaryRegion;

/// Convergence precision for the placement geometric median
const MEDIAN_PRECISION: f32 = 0.05;

/// Engine-level team the Defender faction plays on
const DEFENDER_ENGINE_TEAM: u32 = 1;

/// Display labels handed to Attacker factions with their engine teams
const FACTION_LABELS: [&str; 8] = [
    "crimson", "amber", "viridian", "cobalt", "violet", "teal", "magenta", "ochre",
];

/// Observable outcomes of a tick, for embedders and tests
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    PhaseChanged(MatchPhase),
    CorePlaced {
        faction: FactionId,
        cell: CellPos,
    },
    VotekickPassed {
        faction: FactionId,
        target: ParticipantToken,
    },
    VotekickFailed {
        faction: FactionId,
        target: ParticipantToken,
    },
    FactionEliminated {
        faction: FactionId,
        reason: &'static str,
    },
    MatchOver {
        winner: Option<FactionId>,
    },
}

pub struct MatchScheduler {
    config: MatchConfig,
    clock: MatchClock,
    phase: MatchPhase,
    hazard: HazardField,
    sanctuary: Option<SanctuaryRegion>,
    sanctuary_active: bool,
    participants: ParticipantRegistry,
    factions: FactionRegistry,
    mediator: EntityHealthMediator,
    /// Authoritative list of every core structure in the match
    cores: Vec<CoreStructure>,
    /// Shared resource storage per faction
    storages: AHashMap<FactionId, ResourceBundle>,
    last_reminder_bucket: i64,
    last_elimination_by_timeout: bool,
    winner: Option<FactionId>,
}

impl MatchScheduler {
    pub fn new(config: MatchConfig, now_ms: i64) -> Self {
        let clock = MatchClock::new(now_ms, config.setup_duration_s());
        let factions = FactionRegistry::new(&config);
        Self {
            config,
            clock,
            phase: MatchPhase::Setup,
            hazard: HazardField::new(),
            sanctuary: None,
            sanctuary_active: false,
            participants: ParticipantRegistry::new(),
            factions,
            mediator: EntityHealthMediator::new(),
            cores: Vec::new(),
            storages: AHashMap::new(),
            last_reminder_bucket: i64::MIN,
            last_elimination_by_timeout: false,
            winner: None,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn winner(&self) -> Option<FactionId> {
        self.winner
    }

    pub fn clock(&self) -> MatchClock {
        self.clock
    }

    pub fn cores(&self) -> &[CoreStructure] {
        &self.cores
    }

    pub fn hazard(&self) -> &HazardField {
        &self.hazard
    }

    pub fn factions(&self) -> &FactionRegistry {
        &self.factions
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    pub fn storage(&self, faction: FactionId) -> Option<&ResourceBundle> {
        self.storages.get(&faction)
    }

    /// Credits a faction's shared storage directly (admin grants, salvage)
    pub fn grant_resources(&mut self, faction: FactionId, bundle: &ResourceBundle) {
        self.storages.entry(faction).or_default().merge(bundle);
    }

    // === tick loop ===

    /// One pass of the cooperative tick loop. Faults are caught here,
    /// dumped as a structured diagnostic, and the match continues.
    pub fn tick<H: HostEngine>(&mut self, host: &mut H, now_ms: i64) -> Vec<MatchEvent> {
        let mut events = Vec::new();
        if let Err(fault) = self.tick_inner(host, now_ms, &mut events) {
            let snapshot = json!({
                "phase": format!("{:?}", self.phase),
                "elapsed_s": self.clock.elapsed_s(now_ms),
                "attackers": self.factions.attacker_count(),
                "cores": self.cores.len(),
                "fault": fault.to_string(),
            });
            error!(%snapshot, "tick fault, continuing next tick");
        }
        events
    }

    fn tick_inner<H: HostEngine>(
        &mut self,
        host: &mut H,
        now_ms: i64,
        events: &mut Vec<MatchEvent>,
    ) -> Result<()> {
        self.bookkeeping(host, now_ms, events);
        if self.hazard.is_recomputing() {
            self.hazard.step_full_recompute(&self.cores, host);
        }
        self.mediate(host, now_ms);
        self.step_phase(host, now_ms, events)
    }

    fn bookkeeping<H: HostEngine>(
        &mut self,
        host: &mut H,
        now_ms: i64,
        events: &mut Vec<MatchEvent>,
    ) {
        let online: Vec<ParticipantToken> = self
            .participants
            .iter()
            .filter(|p| p.online)
            .map(|p| p.token)
            .collect();
        for token in online {
            self.participants.mark_seen(token, now_ms);
        }

        for event in self.factions.tick(now_ms) {
            match event {
                FactionEvent::VotekickPassed { faction, target } => {
                    host.assign_participant(target, DEFENDER_ENGINE_TEAM);
                    host.notify_participant(target, "you were voted out of your faction");
                    events.push(MatchEvent::VotekickPassed { faction, target });
                }
                FactionEvent::VotekickFailed { faction, target } => {
                    events.push(MatchEvent::VotekickFailed { faction, target });
                }
                FactionEvent::Disbanded { faction } => {
                    host.broadcast(&format!("faction {} disbanded", faction.0));
                }
            }
        }

        if matches!(self.phase, MatchPhase::Setup | MatchPhase::Placement) {
            let elapsed = self.clock.elapsed_s(now_ms);
            let bucket = elapsed.div_euclid(self.config.reminder_interval_s);
            if bucket != self.last_reminder_bucket {
                self.last_reminder_bucket = bucket;
                match self.phase {
                    MatchPhase::Setup => {
                        let remaining = -elapsed - self.config.placement_duration_s;
                        if remaining > 0 {
                            host.broadcast(&format!(
                                "faction formation closes in {}s",
                                remaining
                            ));
                        }
                    }
                    _ => {
                        let remaining = -elapsed;
                        if remaining > 0 {
                            host.broadcast(&format!("match starts in {}s", remaining));
                        }
                    }
                }
            }
        }
    }

    fn mediate<H: HostEngine>(&mut self, host: &mut H, now_ms: i64) {
        let Some(sanctuary) = self.sanctuary else {
            return;
        };
        self.sanctuary_active =
            sanctuary.is_active(self.factions.attacker_count(), self.clock, now_ms);
        self.mediator.tick(
            host,
            &self.hazard,
            &sanctuary,
            self.sanctuary_active,
            &self.config,
            now_ms,
        );
    }

    fn step_phase<H: HostEngine>(
        &mut self,
        host: &mut H,
        now_ms: i64,
        events: &mut Vec<MatchEvent>,
    ) -> Result<()> {
        let elapsed = self.clock.elapsed_s(now_ms);
        match self.phase {
            MatchPhase::Setup => {
                if elapsed >= -self.config.placement_duration_s {
                    if self.factions.attacker_count() == 0 {
                        // Nobody formed a faction; there is no match to play
                        host.broadcast("no factions formed, the match is called off");
                        self.finish(host, None, events);
                    } else {
                        self.enter_placement(host, events);
                    }
                }
                Ok(())
            }
            MatchPhase::Placement => {
                if elapsed >= 0 {
                    self.enter_active(host, events);
                }
                Ok(())
            }
            MatchPhase::Active => {
                self.check_end(host, now_ms, events);
                Ok(())
            }
            MatchPhase::Over => Ok(()),
        }
    }

    // === phase transitions ===

    fn enter_placement<H: HostEngine>(&mut self, host: &mut H, events: &mut Vec<MatchEvent>) {
        let (width, height) = host.dimensions();
        self.hazard.init(host);
        self.sanctuary = Some(SanctuaryRegion::new(width, height, &self.config));

        // Pre-placed cores (the Defender stronghold) become authoritative
        for structure in host.structures() {
            if let StructureKind::Core(tier) = structure.kind {
                self.cores.push(CoreStructure {
                    id: structure.id,
                    tier,
                    pos: structure.pos,
                    faction: structure.faction,
                });
            }
        }

        // Engine teams and labels for every formed faction
        let attacker_ids = self.factions.attacker_ids();
        for id in attacker_ids {
            let engine_team = self.config.engine_team_base + id.0;
            let label = FACTION_LABELS[(id.0 as usize - 1) % FACTION_LABELS.len()].to_string();
            if let Some(faction) = self.factions.get_mut(id) {
                faction.engine_team = Some(engine_team);
                faction.label = Some(label);
                for token in faction.members.clone() {
                    host.assign_participant(token, engine_team);
                }
            }
        }
        for token in self.factions.defender().members.clone() {
            host.assign_participant(token, DEFENDER_ENGINE_TEAM);
        }

        info!(attackers = self.factions.attacker_count(), "placement window open");
        host.broadcast(&format!(
            "faction formation closed, match starts in {}s",
            self.config.placement_duration_s
        ));
        self.phase = MatchPhase::Placement;
        events.push(MatchEvent::PhaseChanged(MatchPhase::Placement));
    }

    fn enter_active<H: HostEngine>(&mut self, host: &mut H, events: &mut Vec<MatchEvent>) {
        // Defensive snapshot: disqualifications mutate the registry
        for id in self.factions.attacker_ids() {
            match self.place_faction_core(host, id) {
                Ok((cell, adjusted)) => {
                    events.push(MatchEvent::CorePlaced { faction: id, cell });
                    if adjusted {
                        self.notify_faction(host, id, "starting position adjusted to valid ground");
                    }
                }
                Err(MatchError::TimeoutElimination { reason, .. }) => {
                    self.eliminate_faction(host, id, reason, true, events);
                }
                Err(fault) => {
                    warn!(faction = id.0, %fault, "placement failed, disqualifying");
                    self.notify_faction(host, id, "faction disqualified: technical error");
                    self.eliminate_faction(host, id, "placement unresolvable", false, events);
                }
            }
        }

        // Starting loadouts for everyone still in the match
        self.storages
            .entry(FactionId::DEFENDER)
            .or_default()
            .merge(&self.config.defender_loadout);
        for id in self.factions.attacker_ids() {
            self.storages
                .entry(id)
                .or_default()
                .merge(&self.config.attacker_loadout);
        }

        self.hazard.begin_full_recompute();
        info!(
            attackers = self.factions.attacker_count(),
            cores = self.cores.len(),
            "match active"
        );
        host.broadcast("the match has begun");
        self.phase = MatchPhase::Active;
        events.push(MatchEvent::PhaseChanged(MatchPhase::Active));
    }

    /// Places one faction's starting core at the geometric median of its
    /// online members' positions, Bastion tier.
    fn place_faction_core<H: HostEngine>(
        &mut self,
        host: &mut H,
        id: FactionId,
    ) -> Result<(CellPos, bool)> {
        let members = match self.factions.get(id) {
            Some(faction) => faction.members.clone(),
            None => return Err(MatchError::Internal(format!("no faction {}", id.0))),
        };
        let positions: Vec<Vec2> = members
            .iter()
            .filter(|t| self.participants.get(**t).map(|p| p.online).unwrap_or(false))
            .filter_map(|t| host.participant_position(*t))
            .collect();
        if positions.is_empty() {
            return Err(MatchError::TimeoutElimination {
                faction: id,
                reason: "no member present at match start",
            });
        }

        let median = geometric_median(&positions, MEDIAN_PRECISION)?;
        let resolution =
            resolve_core_placement(median, true, &self.cores, &*host, &self.config, id)?;

        let tier = CoreTier::Bastion;
        let structure_id = host.place_core(resolution.cell, tier, id);
        self.cores.push(CoreStructure {
            id: structure_id,
            tier,
            pos: resolution.cell,
            faction: id,
        });
        self.hazard.invalidate_region(
            resolution.cell,
            tier.safety_radius() + 2.0,
            &self.cores,
            host,
        );
        Ok((resolution.cell, resolution.adjusted))
    }

    // === active-phase end conditions ===

    fn check_end<H: HostEngine>(
        &mut self,
        host: &mut H,
        now_ms: i64,
        events: &mut Vec<MatchEvent>,
    ) {
        // Per-faction eliminations over a defensive snapshot
        for id in self.factions.attacker_ids() {
            if !self.cores.iter().any(|c| c.faction == id) {
                self.eliminate_faction(host, id, "lost every core", false, events);
            } else if self.factions.time_offline(id, &self.participants, now_ms)
                >= self.config.offline_timeout_ms
            {
                self.eliminate_faction(host, id, "every member offline too long", true, events);
            } else if self.factions.time_idle(id, &self.participants, now_ms)
                >= self.config.inactivity_timeout_ms
            {
                self.eliminate_faction(host, id, "no member activity too long", true, events);
            }
        }

        let defender_has_cores = self
            .cores
            .iter()
            .any(|c| c.faction == FactionId::DEFENDER);
        if !defender_has_cores {
            let survivors = self.factions.attacker_ids();
            let winner = match survivors.as_slice() {
                [sole] => Some(*sole),
                _ => None,
            };
            self.finish(host, winner, events);
            return;
        }

        if self.factions.attacker_count() == 0 {
            let winner = if self.last_elimination_by_timeout && !self.config.defender_wins_on_timeout
            {
                None
            } else {
                Some(FactionId::DEFENDER)
            };
            self.finish(host, winner, events);
            return;
        }

        // Global inactivity: nobody connected, or nobody doing anything
        let mut any_online = false;
        let mut any_record = false;
        let mut latest_seen = i64::MIN;
        let mut latest_active = i64::MIN;
        for record in self.participants.iter() {
            any_record = true;
            any_online |= record.online;
            latest_seen = latest_seen.max(record.last_seen_ms);
            latest_active = latest_active.max(record.last_active_ms);
        }
        if any_record {
            if !any_online && now_ms - latest_seen >= self.config.offline_timeout_ms {
                host.broadcast("match abandoned: nobody connected");
                self.finish(host, None, events);
            } else if now_ms - latest_active >= self.config.inactivity_timeout_ms {
                host.broadcast("match abandoned: no activity");
                self.finish(host, None, events);
            }
        }
    }

    fn finish<H: HostEngine>(
        &mut self,
        host: &mut H,
        winner: Option<FactionId>,
        events: &mut Vec<MatchEvent>,
    ) {
        self.phase = MatchPhase::Over;
        self.winner = winner;
        match winner {
            Some(id) if id.is_defender() => host.broadcast("the Defenders hold: victory"),
            Some(id) => {
                let label = self
                    .factions
                    .get(id)
                    .and_then(|f| f.label.clone())
                    .unwrap_or_else(|| format!("faction {}", id.0));
                host.broadcast(&format!("the {} faction has taken the stronghold", label));
            }
            None => host.broadcast("the match ends with no victor"),
        }
        info!(winner = ?winner, "match over");
        events.push(MatchEvent::MatchOver { winner });
    }

    fn eliminate_faction<H: HostEngine>(
        &mut self,
        host: &mut H,
        id: FactionId,
        reason: &'static str,
        by_timeout: bool,
        events: &mut Vec<MatchEvent>,
    ) {
        let members = self.factions.eliminate(id);
        for token in &members {
            host.notify_participant(*token, &format!("your faction is out: {}", reason));
        }
        let doomed: Vec<CoreStructure> = self
            .cores
            .iter()
            .filter(|c| c.faction == id)
            .copied()
            .collect();
        self.cores.retain(|c| c.faction != id);
        for core in doomed {
            host.remove_structure(core.id);
            self.hazard.invalidate_region(
                core.pos,
                core.tier.safety_radius() + 2.0,
                &self.cores,
                host,
            );
        }
        self.storages.remove(&id);
        self.last_elimination_by_timeout = by_timeout;
        host.broadcast(&format!("faction {} eliminated: {}", id.0, reason));
        events.push(MatchEvent::FactionEliminated {
            faction: id,
            reason,
        });
    }

    fn notify_faction<H: HostEngine>(&self, host: &mut H, id: FactionId, message: &str) {
        if let Some(faction) = self.factions.get(id) {
            for token in &faction.members {
                host.notify_participant(*token, message);
            }
        }
    }

    // === inbound events from the host ===

    pub fn participant_join<H: HostEngine>(
        &mut self,
        host: &mut H,
        token: ParticipantToken,
        now_ms: i64,
    ) {
        self.participants.lookup_or_create(token, now_ms);
        self.participants.set_online(token, true, now_ms);
        // During setup participants stay neutral until they pick a side;
        // late joiners bolster the Defenders
        if self.phase != MatchPhase::Setup && self.factions.faction_of(token).is_none() {
            self.factions.join_defender(token);
            host.assign_participant(token, DEFENDER_ENGINE_TEAM);
        }
    }

    pub fn participant_leave(&mut self, token: ParticipantToken, now_ms: i64) {
        self.participants.set_online(token, false, now_ms);
    }

    pub fn entity_created(&mut self, id: EntityId, max_health: f32) {
        self.mediator.entity_created(id, max_health);
    }

    pub fn entity_destroyed(&mut self, id: EntityId) {
        self.mediator.entity_destroyed(id);
    }

    /// A structure died in the world (combat, demolition). Cores leave the
    /// authoritative list and their territory reverts.
    pub fn structure_destroyed<H: HostEngine>(&mut self, host: &mut H, id: StructureId) {
        let Some(pos) = self.cores.iter().position(|c| c.id == id) else {
            return;
        };
        let core = self.cores.remove(pos);
        self.hazard.invalidate_region(
            core.pos,
            core.tier.safety_radius() + 2.0,
            &self.cores,
            host,
        );
        host.broadcast(&format!("faction {} lost a core", core.faction.0));
    }

    /// Marks builder activity; the placement legality itself goes through
    /// [`validate_placement`](Self::validate_placement).
    pub fn structure_built(&mut self, builder: ParticipantToken, now_ms: i64) {
        self.participants.mark_active(builder, now_ms);
    }

    /// Queues a click action for the participant's next structure tap.
    pub fn arm_click_action(&mut self, token: ParticipantToken, action: ClickAction, now_ms: i64) {
        self.participants.lookup_or_create(token, now_ms).click_action = Some(action);
    }

    /// A participant tapped a structure. Consumes any armed click action;
    /// otherwise a tap on an own depot during the active phase attempts the
    /// depot-to-core conversion (debounced against double-fired events).
    pub fn point_activated<H: HostEngine>(
        &mut self,
        host: &mut H,
        token: ParticipantToken,
        structure: StructureId,
        now_ms: i64,
    ) {
        self.participants.mark_active(token, now_ms);
        let Some(view) = host.structures().into_iter().find(|s| s.id == structure) else {
            return;
        };
        let faction = self.factions.faction_of(token);

        if let Some(action) = self.participants.take_click_action(token) {
            self.consume_click_action(host, token, faction, &view, action);
            return;
        }

        let Some(faction) = faction else { return };
        if view.kind != StructureKind::Depot
            || view.faction != faction
            || faction.is_defender()
            || self.phase != MatchPhase::Active
        {
            return;
        }

        // Tap debounce
        if let Some(record) = self.participants.get_mut(token) {
            if now_ms - record.last_core_attempt_ms < self.config.depot_tap_debounce_ms {
                return;
            }
            record.last_core_attempt_ms = now_ms;
        }

        self.attempt_core_conversion(host, token, faction, &view);
    }

    fn consume_click_action<H: HostEngine>(
        &mut self,
        host: &mut H,
        token: ParticipantToken,
        faction: Option<FactionId>,
        view: &StructureView,
        action: ClickAction,
    ) {
        if faction != Some(view.faction) {
            host.notify_participant(token, "that structure is not yours");
            return;
        }
        match action {
            ClickAction::Demolish => {
                host.remove_structure(view.id);
                if self.cores.iter().any(|c| c.id == view.id) {
                    self.structure_destroyed(host, view.id);
                }
            }
            ClickAction::RemoveCore => {
                let owned = self
                    .cores
                    .iter()
                    .filter(|c| c.faction == view.faction)
                    .count();
                if !self.cores.iter().any(|c| c.id == view.id) {
                    host.notify_participant(token, "that is not a core");
                } else if owned <= 1 {
                    host.notify_participant(token, "cannot decommission your last core");
                } else {
                    host.remove_structure(view.id);
                    self.structure_destroyed(host, view.id);
                }
            }
        }
    }

    fn attempt_core_conversion<H: HostEngine>(
        &mut self,
        host: &mut H,
        token: ParticipantToken,
        faction: FactionId,
        depot: &StructureView,
    ) {
        let cell = depot.pos;
        let tier = CoreTier::Outpost;

        // Anchoring rules mirror the placement search constraints
        if let Some(terrain) = host.terrain(cell) {
            if terrain.always_safe() {
                host.notify_participant(token, "cores cannot anchor on safe ground");
                return;
            }
        }
        let min2 = self.config.core_min_distance * self.config.core_min_distance;
        let defender_min2 =
            self.config.defender_core_min_distance * self.config.defender_core_min_distance;
        for core in &self.cores {
            if core.faction == faction {
                continue;
            }
            let required = if core.faction.is_defender() {
                defender_min2
            } else {
                min2
            };
            if cell.dst2(core.pos) < required {
                host.notify_participant(token, "too close to a rival core");
                return;
            }
        }

        let own_cores: Vec<CoreStructure> = self
            .cores
            .iter()
            .filter(|c| c.faction == faction)
            .copied()
            .collect();
        let quote = quote_core(cell, &own_cores, &self.config);
        let storage = self.storages.entry(faction).or_default();
        match commit_core(&quote, &depot.contents, storage) {
            Ok(_) => {
                host.remove_structure(depot.id);
                let id = host.place_core(cell, tier, faction);
                self.cores.push(CoreStructure {
                    id,
                    tier,
                    pos: cell,
                    faction,
                });
                self.hazard.invalidate_region(
                    cell,
                    tier.safety_radius() + 2.0,
                    &self.cores,
                    host,
                );
                info!(faction = faction.0, x = cell.x, y = cell.y, "depot converted to core");
                self.notify_faction(
                    host,
                    faction,
                    &format!("new core established, paid {}", quote.shared_cost),
                );
            }
            Err(MatchError::InsufficientResources { missing }) => {
                host.notify_participant(token, &format!("cannot afford a core: need {}", missing));
            }
            Err(fault) => {
                warn!(faction = faction.0, %fault, "core conversion fault");
            }
        }
    }

    /// Synchronous pre-commit validation hook. The host calls this for
    /// every attempted structure placement and must deny anything rejected
    /// here before committing it.
    pub fn validate_placement<H: HostEngine>(
        &mut self,
        host: &mut H,
        builder: ParticipantToken,
        cell: CellPos,
        kind: StructureKind,
        now_ms: i64,
    ) -> std::result::Result<(), ValidationFailure> {
        self.participants.mark_active(builder, now_ms);
        if self.phase != MatchPhase::Active {
            return Err(ValidationFailure::MatchNotStarted);
        }
        let Some(faction) = self.factions.faction_of(builder) else {
            return Err(ValidationFailure::NeutralBuilder);
        };

        let size = kind.footprint();
        let (width, height) = host.dimensions();
        let low_x = cell.x - (size - 1) / 2;
        let low_y = cell.y - (size - 1) / 2;
        for (dx, dy) in [(0, 0), (size - 1, 0), (0, size - 1), (size - 1, size - 1)] {
            let corner = CellPos::new(low_x + dx, low_y + dy);
            if corner.x < 0 || corner.y < 0 || corner.x >= width || corner.y >= height {
                return Err(ValidationFailure::OutOfBounds);
            }
            match host.terrain(corner) {
                Some(terrain) if terrain.placeable() => {}
                _ => return Err(ValidationFailure::NotPlaceable),
            }
        }

        // Bypass the cache only while a staggered recompute is in flight
        // and cached values may be stale
        let hard = self.hazard.is_recomputing();
        if self
            .hazard
            .footprint_hazardous(cell, size, &self.cores, host, hard)
        {
            return Err(ValidationFailure::InsideHazard);
        }

        if kind == StructureKind::Turret && faction.is_defender() && self.sanctuary_active {
            if let Some(sanctuary) = self.sanctuary {
                if sanctuary.contains_footprint(cell, size) {
                    return Err(ValidationFailure::TurretInSanctuary);
                }
            }
        }

        if matches!(kind, StructureKind::Core(_)) {
            if let Some(terrain) = host.terrain(cell) {
                if terrain.always_safe() {
                    return Err(ValidationFailure::SafeGroundCore);
                }
            }
        }

        Ok(())
    }

    // === faction command surface ===

    /// Forms a new Attacker faction. Only allowed during setup.
    pub fn cmd_form_faction(
        &mut self,
        token: ParticipantToken,
        now_ms: i64,
    ) -> Option<FactionId> {
        self.participants.lookup_or_create(token, now_ms);
        self.participants.mark_active(token, now_ms);
        if self.phase != MatchPhase::Setup {
            return None;
        }
        self.factions.form_attacker(token)
    }

    pub fn cmd_join(
        &mut self,
        token: ParticipantToken,
        faction: FactionId,
        now_ms: i64,
    ) -> crate::faction::AdmissionOutcome {
        self.participants.lookup_or_create(token, now_ms);
        self.participants.mark_active(token, now_ms);
        self.factions.request_join(token, faction)
    }

    pub fn cmd_invite(
        &mut self,
        inviter: ParticipantToken,
        target: ParticipantToken,
        now_ms: i64,
    ) -> crate::faction::AdmissionOutcome {
        self.participants.mark_active(inviter, now_ms);
        match self.factions.faction_of(inviter) {
            Some(id) if !id.is_defender() => self.factions.invite(id, target),
            _ => crate::faction::AdmissionOutcome::NoSuchFaction,
        }
    }

    pub fn cmd_quit(&mut self, token: ParticipantToken, now_ms: i64) -> Option<FactionId> {
        self.participants.mark_active(token, now_ms);
        self.factions.quit(token)
    }

    pub fn cmd_set_open(&mut self, token: ParticipantToken, open: bool, now_ms: i64) -> bool {
        self.participants.mark_active(token, now_ms);
        let Some(id) = self.factions.faction_of(token) else {
            return false;
        };
        match self.factions.get_mut(id) {
            Some(faction) if !id.is_defender() => {
                faction.open = open;
                true
            }
            _ => false,
        }
    }

    /// Starts a votekick in the initiator's faction. The deadline depends
    /// on whether the match is already underway.
    pub fn cmd_votekick(
        &mut self,
        initiator: ParticipantToken,
        target: ParticipantToken,
        now_ms: i64,
    ) -> bool {
        self.participants.mark_active(initiator, now_ms);
        let Some(id) = self.factions.faction_of(initiator) else {
            return false;
        };
        let duration = if self.phase == MatchPhase::Active {
            self.config.votekick_ms
        } else {
            self.config.votekick_pregame_ms
        };
        self.factions.start_votekick(id, initiator, target, now_ms, duration)
    }

    pub fn cmd_vote(&mut self, voter: ParticipantToken, ballot: Ballot, now_ms: i64) -> bool {
        self.participants.mark_active(voter, now_ms);
        let Some(id) = self.factions.faction_of(voter) else {
            return false;
        };
        self.factions.cast_vote(id, voter, ballot)
    }
}
