//! Depot-to-core conversion integration tests
//!
//! Exercises the full pricing path through the scheduler: quoting against
//! the faction's existing cores, the shortfall report, the debounced tap,
//! and a successful conversion with leftover depot contents pouring into
//! shared storage.

use redoubt::core::config::MatchConfig;
use redoubt::core::types::{
    CellPos, ClickAction, CoreTier, FactionId, MatchPhase, ParticipantToken, TerrainKind, Vec2,
};
use redoubt::resources::{Resource, ResourceBundle};
use redoubt::scheduler::MatchScheduler;
use redoubt::testkit::MockHost;

const ACTIVE_AT_MS: i64 = 30_000;

struct Fixture {
    host: MockHost,
    sim: MatchScheduler,
    alice: ParticipantToken,
    faction: FactionId,
}

/// One attacker faction, match driven into the active phase.
fn active_match() -> Fixture {
    let mut host = MockHost::uniform(600, 600, TerrainKind::Rock);
    use redoubt::host::HostEngine;
    host.place_core(CellPos::new(298, 298), CoreTier::Citadel, FactionId::DEFENDER);

    let mut sim = MatchScheduler::new(MatchConfig::default(), 0);
    let alice = ParticipantToken(1);
    sim.participant_join(&mut host, alice, 0);
    host.positions.insert(alice, Vec2::new(60.0, 60.0));
    let faction = sim.cmd_form_faction(alice, 500).unwrap();

    sim.tick(&mut host, 21_000);
    sim.tick(&mut host, ACTIVE_AT_MS + 1_000);
    assert_eq!(sim.phase(), MatchPhase::Active);

    Fixture {
        host,
        sim,
        alice,
        faction,
    }
}

fn depot_contents() -> ResourceBundle {
    ResourceBundle::of(&[
        (Resource::Uranium, 1_500),
        (Resource::Fiber, 300),
        (Resource::Glass, 120),
    ])
}

#[test]
fn test_conversion_denied_on_shortfall() {
    let mut fx = active_match();
    let depot = fx
        .host
        .spawn_depot(fx.faction, CellPos::new(70, 60), depot_contents());

    // Starting loadout does not cover a ramped one-core price
    fx.sim
        .point_activated(&mut fx.host, fx.alice, depot, ACTIVE_AT_MS + 2_000);
    assert!(fx.host.structure(depot).is_some());
    assert!(fx
        .host
        .notifications
        .iter()
        .any(|(t, m)| *t == fx.alice && m.contains("cannot afford")));
}

#[test]
fn test_debounce_swallows_double_tap() {
    let mut fx = active_match();
    let depot = fx
        .host
        .spawn_depot(fx.faction, CellPos::new(70, 60), depot_contents());

    fx.sim
        .point_activated(&mut fx.host, fx.alice, depot, ACTIVE_AT_MS + 2_000);
    fx.sim
        .point_activated(&mut fx.host, fx.alice, depot, ACTIVE_AT_MS + 2_050);
    let denials = fx
        .host
        .notifications
        .iter()
        .filter(|(_, m)| m.contains("cannot afford"))
        .count();
    assert_eq!(denials, 1);
}

#[test]
fn test_conversion_places_core_and_pours_leftover() {
    let mut fx = active_match();
    let depot_pos = CellPos::new(70, 60);
    let depot = fx.host.spawn_depot(fx.faction, depot_pos, depot_contents());

    fx.sim.grant_resources(
        fx.faction,
        &ResourceBundle::of(&[
            (Resource::Copper, 50_000),
            (Resource::Silicon, 500_000),
            (Resource::Fiber, 100_000),
            (Resource::Polymer, 20_000),
            (Resource::Uranium, 20_000),
            (Resource::Catalyst, 500_000),
        ]),
    );
    fx.sim
        .point_activated(&mut fx.host, fx.alice, depot, ACTIVE_AT_MS + 2_000);

    // Depot gone, Outpost core standing in its place
    assert!(fx.host.removed_structures.contains(&depot));
    let core = fx
        .sim
        .cores()
        .iter()
        .find(|c| c.pos == depot_pos)
        .copied()
        .expect("converted core");
    assert_eq!(core.tier, CoreTier::Outpost);
    assert_eq!(core.faction, fx.faction);

    // Leftover depot contents beyond the depot cost landed in storage;
    // the shared price then took its ramped per-core uranium (500 * 3)
    let storage = fx.sim.storage(fx.faction).unwrap();
    assert_eq!(storage.get(Resource::Glass), 120);
    assert_eq!(storage.get(Resource::Uranium), 20_000 + 500 - 1_500);

    // The new territory is carved out of the hazard field
    assert!(!fx.sim.hazard().query(depot_pos));
}

#[test]
fn test_conversion_blocked_near_rival_core() {
    let mut fx = active_match();
    // Well inside the Defender exclusion margin
    let depot = fx
        .host
        .spawn_depot(fx.faction, CellPos::new(200, 200), depot_contents());

    fx.sim
        .point_activated(&mut fx.host, fx.alice, depot, ACTIVE_AT_MS + 2_000);
    assert!(fx.host.structure(depot).is_some());
    assert!(fx
        .host
        .notifications
        .iter()
        .any(|(t, m)| *t == fx.alice && m.contains("too close")));
}

#[test]
fn test_demolish_click_action() {
    let mut fx = active_match();
    let shed = fx.host.spawn_structure(
        fx.faction,
        CellPos::new(66, 60),
        redoubt::host::StructureKind::Other,
        200.0,
    );

    fx.sim
        .arm_click_action(fx.alice, ClickAction::Demolish, ACTIVE_AT_MS + 2_000);
    fx.sim
        .point_activated(&mut fx.host, fx.alice, shed, ACTIVE_AT_MS + 2_100);
    assert!(fx.host.removed_structures.contains(&shed));
}

#[test]
fn test_remove_core_refuses_last_core() {
    let mut fx = active_match();
    let core = fx
        .sim
        .cores()
        .iter()
        .find(|c| c.faction == fx.faction)
        .copied()
        .unwrap();

    fx.sim
        .arm_click_action(fx.alice, ClickAction::RemoveCore, ACTIVE_AT_MS + 2_000);
    fx.sim
        .point_activated(&mut fx.host, fx.alice, core.id, ACTIVE_AT_MS + 2_100);
    assert!(!fx.host.removed_structures.contains(&core.id));
    assert!(fx
        .host
        .notifications
        .iter()
        .any(|(t, m)| *t == fx.alice && m.contains("last core")));
}
