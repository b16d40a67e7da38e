//! Match lifecycle integration tests
//!
//! Drives whole matches against the in-memory reference host: phase
//! progression, starting-core placement, votekicks, eliminations, hazard
//! deaths, and the sanctuary transitions.

use redoubt::core::config::MatchConfig;
use redoubt::core::types::{
    CellPos, CoreTier, EntityId, FactionId, MatchPhase, ParticipantToken, TerrainKind, Vec2,
};
use redoubt::faction::Ballot;
use redoubt::host::{HostEngine, StructureKind};
use redoubt::scheduler::{MatchEvent, MatchScheduler};
use redoubt::testkit::MockHost;

const ACTIVE_AT_MS: i64 = 30_000;

fn world_with_stronghold() -> (MockHost, redoubt::core::types::StructureId) {
    let mut host = MockHost::uniform(600, 600, TerrainKind::Rock);
    let id = host.place_core(CellPos::new(298, 298), CoreTier::Citadel, FactionId::DEFENDER);
    (host, id)
}

fn join_at(
    sim: &mut MatchScheduler,
    host: &mut MockHost,
    token: ParticipantToken,
    position: Vec2,
) {
    sim.participant_join(host, token, 0);
    host.positions.insert(token, position);
}

/// Single attacker faction takes the stronghold: the sole survivor wins.
#[test]
fn test_sole_attacker_wins_when_stronghold_falls() {
    let (mut host, stronghold) = world_with_stronghold();
    let mut sim = MatchScheduler::new(MatchConfig::default(), 0);

    let alice = ParticipantToken(1);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    let faction = sim.cmd_form_faction(alice, 500).unwrap();

    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);
    assert_eq!(sim.phase(), MatchPhase::Active);
    assert!(sim.cores().iter().any(|c| c.faction == faction));

    host.remove_structure(stronghold);
    sim.structure_destroyed(&mut host, stronghold);
    let events = sim.tick(&mut host, ACTIVE_AT_MS + 2_000);
    assert!(events.contains(&MatchEvent::MatchOver {
        winner: Some(faction)
    }));
    assert_eq!(sim.winner(), Some(faction));
    assert_eq!(sim.phase(), MatchPhase::Over);
}

/// With two surviving attackers the stronghold falling crowns nobody.
#[test]
fn test_no_winner_with_multiple_survivors() {
    let (mut host, stronghold) = world_with_stronghold();
    let mut sim = MatchScheduler::new(MatchConfig::default(), 0);

    let alice = ParticipantToken(1);
    let bob = ParticipantToken(2);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    join_at(&mut sim, &mut host, bob, Vec2::new(540.0, 540.0));
    sim.cmd_form_faction(alice, 500).unwrap();
    sim.cmd_form_faction(bob, 500).unwrap();

    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);

    host.remove_structure(stronghold);
    sim.structure_destroyed(&mut host, stronghold);
    let events = sim.tick(&mut host, ACTIVE_AT_MS + 2_000);
    assert!(events.contains(&MatchEvent::MatchOver { winner: None }));
}

/// Losing your own last core eliminates the faction, which hands the
/// Defenders the match once no attacker remains.
#[test]
fn test_defender_wins_when_attackers_eliminated() {
    let (mut host, _) = world_with_stronghold();
    let mut sim = MatchScheduler::new(MatchConfig::default(), 0);

    let alice = ParticipantToken(1);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    let faction = sim.cmd_form_faction(alice, 500).unwrap();

    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);

    let core = sim
        .cores()
        .iter()
        .find(|c| c.faction == faction)
        .copied()
        .unwrap();
    host.remove_structure(core.id);
    sim.structure_destroyed(&mut host, core.id);

    let events = sim.tick(&mut host, ACTIVE_AT_MS + 2_000);
    assert!(events
        .iter()
        .any(|e| matches!(e, MatchEvent::FactionEliminated { faction: f, .. } if *f == faction)));
    assert!(events.contains(&MatchEvent::MatchOver {
        winner: Some(FactionId::DEFENDER)
    }));
}

/// Every member going dark long enough times the faction out; with the
/// default configuration that is still a Defender victory.
#[test]
fn test_offline_timeout_eliminates_faction() {
    let (mut host, _) = world_with_stronghold();
    let config = MatchConfig::default();
    let timeout = config.offline_timeout_ms;
    let mut sim = MatchScheduler::new(config, 0);

    let alice = ParticipantToken(1);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    sim.cmd_form_faction(alice, 500).unwrap();

    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);
    sim.participant_leave(alice, ACTIVE_AT_MS + 2_000);

    let events = sim.tick(&mut host, ACTIVE_AT_MS + 2_000 + timeout);
    assert!(events
        .iter()
        .any(|e| matches!(e, MatchEvent::FactionEliminated { .. })));
    assert!(events.contains(&MatchEvent::MatchOver {
        winner: Some(FactionId::DEFENDER)
    }));
}

/// Same timeout with `defender_wins_on_timeout` off ends the match with
/// no victor.
#[test]
fn test_timeout_without_defender_victory() {
    let (mut host, _) = world_with_stronghold();
    let config = MatchConfig {
        defender_wins_on_timeout: false,
        ..MatchConfig::default()
    };
    let timeout = config.offline_timeout_ms;
    let mut sim = MatchScheduler::new(config, 0);

    let alice = ParticipantToken(1);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    sim.cmd_form_faction(alice, 500).unwrap();

    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);
    sim.participant_leave(alice, ACTIVE_AT_MS + 2_000);

    let events = sim.tick(&mut host, ACTIVE_AT_MS + 2_000 + timeout);
    assert!(events.contains(&MatchEvent::MatchOver { winner: None }));
}

/// A votekick started during setup resolves early once the outcome is
/// settled; the target lands with the Defenders.
#[test]
fn test_setup_votekick_relocates_target() {
    let (mut host, _) = world_with_stronghold();
    let mut sim = MatchScheduler::new(MatchConfig::default(), 0);

    let alice = ParticipantToken(1);
    let bob = ParticipantToken(2);
    let carol = ParticipantToken(3);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    join_at(&mut sim, &mut host, bob, Vec2::new(62.0, 60.0));
    join_at(&mut sim, &mut host, carol, Vec2::new(64.0, 60.0));

    let faction = sim.cmd_form_faction(alice, 500).unwrap();
    sim.cmd_set_open(alice, true, 600);
    sim.cmd_join(bob, faction, 700);
    sim.cmd_join(carol, faction, 800);

    assert!(sim.cmd_votekick(alice, carol, 1_000));
    assert!(sim.cmd_vote(alice, Ballot::Yes, 1_050));
    assert!(sim.cmd_vote(bob, Ballot::Yes, 1_100));

    let events = sim.tick(&mut host, 2_000);
    assert!(events.contains(&MatchEvent::VotekickPassed {
        faction,
        target: carol
    }));
    assert_eq!(
        sim.factions().faction_of(carol),
        Some(FactionId::DEFENDER)
    );
    // The remaining pair still place a core together at match start
    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);
    assert!(sim.cores().iter().any(|c| c.faction == faction));
}

/// A mortal entity loitering on hazardous ground is worn down and
/// destroyed by the field.
#[test]
fn test_entity_dies_in_hazard() {
    let (mut host, _) = world_with_stronghold();
    let mut sim = MatchScheduler::new(MatchConfig::default(), 0);

    let alice = ParticipantToken(1);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    let faction = sim.cmd_form_faction(alice, 500).unwrap();

    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);

    // Far from every core: hazardous ground
    let doomed = EntityId(7);
    host.spawn_entity(doomed, faction, CellPos::new(500, 100), 50.0, false);
    sim.entity_created(doomed, 50.0);
    // Couriers shrug the field off
    let courier = EntityId(8);
    host.spawn_entity(courier, faction, CellPos::new(500, 100), 50.0, true);
    sim.entity_created(courier, 50.0);

    for step in 1..=5 {
        sim.tick(&mut host, ACTIVE_AT_MS + 1_000 + step * 1_000);
    }
    assert!(host.destroyed_entities.contains(&doomed));
    assert!(host.entity(courier).is_some());
    assert_eq!(host.entity(courier).unwrap().health, 50.0);
}

/// Sanctuary protection: the stronghold is unkillable during the
/// guaranteed window and reverts to standard health once it lapses.
#[test]
fn test_sanctuary_window_protects_stronghold() {
    let (mut host, stronghold) = world_with_stronghold();
    let config = MatchConfig::default();
    let guaranteed_ms = config.guaranteed_sanctuary_s * 1_000;
    let mut sim = MatchScheduler::new(config, 0);

    let alice = ParticipantToken(1);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    sim.cmd_form_faction(alice, 500).unwrap();

    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);
    assert_eq!(host.structure(stronghold).unwrap().health, f32::MAX);

    // Keep the lone attacker active so inactivity timeouts stay out of
    // the picture, then let the guaranteed window lapse
    sim.structure_built(alice, ACTIVE_AT_MS + guaranteed_ms);
    sim.tick(&mut host, ACTIVE_AT_MS + guaranteed_ms + 2_000);
    assert_eq!(sim.phase(), MatchPhase::Active);
    let view = host.structure(stronghold).unwrap();
    assert_eq!(view.health, view.max_health);
}

/// The pre-commit hook's full denial catalog.
#[test]
fn test_validation_hook_denials() {
    use redoubt::core::error::ValidationFailure;

    let (mut host, _) = world_with_stronghold();
    // A meadow pocket and a slag pocket inside the stronghold's safe radius
    host.set_terrain(CellPos::new(310, 300), TerrainKind::Meadow);
    host.set_terrain(CellPos::new(312, 300), TerrainKind::Slag);

    let mut sim = MatchScheduler::new(MatchConfig::default(), 0);
    let alice = ParticipantToken(1);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    let ghost = ParticipantToken(99);
    sim.cmd_form_faction(alice, 500).unwrap();

    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);
    let t = ACTIVE_AT_MS + 2_000;

    // Unaffiliated participants cannot build
    assert_eq!(
        sim.validate_placement(&mut host, ghost, CellPos::new(300, 305), StructureKind::Other, t),
        Err(ValidationFailure::NeutralBuilder)
    );
    // Out of bounds
    assert_eq!(
        sim.validate_placement(&mut host, alice, CellPos::new(599, 599), StructureKind::Turret, t),
        Err(ValidationFailure::OutOfBounds)
    );
    // Non-placeable terrain
    assert_eq!(
        sim.validate_placement(&mut host, alice, CellPos::new(312, 300), StructureKind::Other, t),
        Err(ValidationFailure::NotPlaceable)
    );
    // Hazardous ground far from any core
    assert_eq!(
        sim.validate_placement(&mut host, alice, CellPos::new(500, 100), StructureKind::Other, t),
        Err(ValidationFailure::InsideHazard)
    );
    // Cores cannot anchor on guaranteed-safe ground
    assert_eq!(
        sim.validate_placement(
            &mut host,
            alice,
            CellPos::new(310, 300),
            StructureKind::Core(CoreTier::Outpost),
            t
        ),
        Err(ValidationFailure::SafeGroundCore)
    );
    // Inside the attacker's own safe radius everything is fine
    let own_core = sim
        .cores()
        .iter()
        .find(|c| !c.faction.is_defender())
        .copied()
        .unwrap();
    assert_eq!(
        sim.validate_placement(
            &mut host,
            alice,
            CellPos::new(own_core.pos.x + 6, own_core.pos.y),
            StructureKind::Other,
            t
        ),
        Ok(())
    );
}

/// Defenders cannot raise turrets inside the sanctuary while it holds.
#[test]
fn test_defender_turret_banned_in_active_sanctuary() {
    use redoubt::core::error::ValidationFailure;

    let (mut host, _) = world_with_stronghold();
    let mut sim = MatchScheduler::new(MatchConfig::default(), 0);

    let alice = ParticipantToken(1);
    join_at(&mut sim, &mut host, alice, Vec2::new(60.0, 60.0));
    sim.cmd_form_faction(alice, 500).unwrap();
    // Dana joins after setup and lands with the Defenders
    let dana = ParticipantToken(2);

    sim.tick(&mut host, 21_000);
    sim.participant_join(&mut host, dana, 22_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);
    assert_eq!(sim.factions().faction_of(dana), Some(FactionId::DEFENDER));

    let t = ACTIVE_AT_MS + 2_000;
    assert_eq!(
        sim.validate_placement(&mut host, dana, CellPos::new(300, 305), StructureKind::Turret, t),
        Err(ValidationFailure::TurretInSanctuary)
    );
    // A plain structure in the same spot is allowed
    assert_eq!(
        sim.validate_placement(&mut host, dana, CellPos::new(300, 305), StructureKind::Other, t),
        Ok(())
    );
}
