//! Synthetic skirmish runner
//!
//! Drives a full match against the in-memory reference host: two
//! participants form an Attacker faction, the phases run on an accelerated
//! clock, and the defender stronghold eventually falls. Useful for eyeballing
//! the scheduler's event stream and log output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use redoubt::core::config::MatchConfig;
use redoubt::core::types::{CellPos, CoreTier, FactionId, ParticipantToken, TerrainKind, Vec2};
use redoubt::host::HostEngine;
use redoubt::scheduler::{MatchEvent, MatchScheduler};
use redoubt::testkit::MockHost;

const WIDTH: i32 = 600;
const HEIGHT: i32 = 600;
const TICK_MS: i64 = 16;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redoubt=info".into()),
        )
        .init();

    let mut host = synthetic_world(42);
    let defender_core =
        host.place_core(CellPos::new(298, 298), CoreTier::Citadel, FactionId::DEFENDER);

    let config = MatchConfig::default();
    let mut sim = MatchScheduler::new(config, 0);

    let alice = ParticipantToken(1);
    let bob = ParticipantToken(2);
    sim.participant_join(&mut host, alice, 0);
    sim.participant_join(&mut host, bob, 0);
    host.positions.insert(alice, Vec2::new(60.0, 80.0));
    host.positions.insert(bob, Vec2::new(90.0, 70.0));

    let faction = sim
        .cmd_form_faction(alice, 500)
        .expect("formation during setup");
    sim.cmd_set_open(alice, true, 600);
    sim.cmd_join(bob, faction, 700);

    let mut now_ms: i64 = 0;
    let mut ticks: u64 = 0;
    loop {
        now_ms += TICK_MS;
        ticks += 1;
        for event in sim.tick(&mut host, now_ms) {
            println!("[{:>7}ms] {:?}", now_ms, event);
            if let MatchEvent::MatchOver { winner } = event {
                report(&host, ticks, winner);
                return;
            }
        }

        // Thirty simulated seconds into the active phase, the stronghold
        // falls to the besiegers
        if sim.clock().elapsed_s(now_ms) == 30 && sim.cores().iter().any(|c| c.id == defender_core)
        {
            println!("[{:>7}ms] -- the defender core is destroyed --", now_ms);
            host.remove_structure(defender_core);
            sim.structure_destroyed(&mut host, defender_core);
        }

        if ticks > 1_000_000 {
            eprintln!("match never ended");
            return;
        }
    }
}

/// Rock plain with a few slag pools and a meadow belt, seeded for
/// reproducible runs.
fn synthetic_world(seed: u64) -> MockHost {
    let mut host = MockHost::uniform(WIDTH, HEIGHT, TerrainKind::Rock);
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..40 {
        let cx = rng.gen_range(0..WIDTH);
        let cy = rng.gen_range(0..HEIGHT);
        let r = rng.gen_range(3..12);
        for x in (cx - r).max(0)..(cx + r).min(WIDTH) {
            for y in (cy - r).max(0)..(cy + r).min(HEIGHT) {
                let cell = CellPos::new(x, y);
                if cell.dst2(CellPos::new(cx, cy)) < (r * r) as f32 {
                    host.set_terrain(cell, TerrainKind::Slag);
                }
            }
        }
    }
    for x in 0..WIDTH {
        for y in 0..3 {
            host.set_terrain(CellPos::new(x, y), TerrainKind::Meadow);
            host.set_terrain(CellPos::new(x, HEIGHT - 1 - y), TerrainKind::Meadow);
        }
    }
    host
}

fn report(host: &MockHost, ticks: u64, winner: Option<FactionId>) {
    println!();
    println!("=== match report ===");
    println!("ticks:      {}", ticks);
    println!("winner:     {:?}", winner);
    println!("broadcasts: {}", host.broadcasts.len());
    for line in &host.broadcasts {
        println!("  {}", line);
    }
}
