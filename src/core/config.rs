//! Match configuration with documented constants
//!
//! All tuning values are collected here with explanations of their purpose
//! and how they interact with each other.

use serde::{Deserialize, Serialize};

use crate::resources::{Resource, ResourceBundle};

/// Configuration for one match
///
/// These values have been tuned against real matches. Changing them will
/// affect pacing, map pressure, and the economy curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    // === FACTIONS ===
    /// Maximum participants that can serve in one Attacker faction
    pub max_faction_members: usize,

    /// Lowest engine-level team id allocated to Attacker factions
    pub engine_team_base: u32,

    /// Milliseconds a faction can have every member offline before it is
    /// eliminated. Also the global all-offline match timeout.
    pub offline_timeout_ms: i64,

    /// Milliseconds without any member activity before a faction is
    /// eliminated. Also the global all-idle match timeout.
    pub inactivity_timeout_ms: i64,

    /// Whether the Defender wins outright when the last Attacker faction is
    /// eliminated by timeout. When false, the match ends without a winner.
    pub defender_wins_on_timeout: bool,

    // === PHASES ===
    /// Seconds of the faction-formation window at the start of setup
    pub formation_duration_s: i64,

    /// Seconds of the core-placement window after formation closes.
    /// The match clock reads `-placement_duration_s` when formation ends
    /// and `0` when the match goes active.
    pub placement_duration_s: i64,

    /// Interval of the remaining-time reminder broadcasts during the
    /// Setup and Placement phases
    pub reminder_interval_s: i64,

    // === VOTEKICK ===
    /// Votekick deadline before the match starts
    pub votekick_pregame_ms: i64,

    /// Votekick deadline once the match is underway
    pub votekick_ms: i64,

    // === PLACEMENT ===
    /// Minimum distance (cells) between a new core and any existing core
    pub core_min_distance: f32,

    /// Minimum distance (cells) between a new core and a Defender core.
    /// Larger than `core_min_distance` so Attackers cannot open the match
    /// pressed against the central stronghold.
    pub defender_core_min_distance: f32,

    /// Farthest (cells) the placement search will adjust an invalid
    /// candidate before giving up
    pub max_adjust_distance: i32,

    // === SANCTUARY ===
    /// Manhattan radius of the sanctuary around the grid center
    pub sanctuary_radius: i32,

    /// Seconds after match start during which the sanctuary is guaranteed
    /// active regardless of how many Attacker factions survive
    pub guaranteed_sanctuary_s: i64,

    // === HAZARD DAMAGE ===
    /// Flat damage per tick applied to non-immune entities on hazardous
    /// cells. Scaled by real elapsed time, not tick count.
    pub hazard_damage_flat: f32,

    /// Fraction of max health lost per tick on hazardous cells
    pub hazard_damage_percent: f32,

    // === PRICING ===
    /// Priced amounts below this are discarded entirely
    pub min_priced_amount: i64,

    /// Harmonic factor at which a full complement of base-tier cores is
    /// guaranteed able to pay the price. Live prices exceeding what that
    /// storage could hold are subtracted back down.
    pub guaranteed_harmonic_factor: f64,

    /// Shared-storage capacity contributed by each existing core when
    /// computing the guaranteed cap
    pub per_core_capacity: i64,

    /// Below this core count, priced amounts are divided by
    /// `count / ramp_up_core_count`, rounded up
    pub ramp_up_core_count: usize,

    /// Exponent applied to the core count in the harmonic distance factor
    pub harmonic_count_power: f64,

    /// Bundle payable only from the initiating depot's own inventory
    pub base_cost: ResourceBundle,

    /// Constant shared-storage bundle added to every core price
    pub shared_base_cost: ResourceBundle,

    /// Shared-storage bundle added once per existing core
    pub per_core_cost: ResourceBundle,

    /// Bundle scaled by the harmonic distance factor
    pub harmonic_cost: ResourceBundle,

    // === LOADOUTS ===
    /// Resources granted to each Attacker faction at match start
    pub attacker_loadout: ResourceBundle,

    /// Resources granted to the Defender faction at match start
    pub defender_loadout: ResourceBundle,

    // === MISC ===
    /// Minimum milliseconds between two depot-conversion attempts by the
    /// same participant (tap debounce)
    pub depot_tap_debounce_ms: i64,
}

impl MatchConfig {
    /// Total setup duration (formation + placement windows)
    pub fn setup_duration_s(&self) -> i64 {
        self.formation_duration_s + self.placement_duration_s
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_faction_members: 3,
            engine_team_base: 7,
            offline_timeout_ms: 5 * 60 * 1000,
            inactivity_timeout_ms: 10 * 60 * 1000,
            defender_wins_on_timeout: true,
            formation_duration_s: 20,
            placement_duration_s: 10,
            reminder_interval_s: 20,
            votekick_pregame_ms: 30 * 1000,
            votekick_ms: 90 * 1000,
            core_min_distance: 120.0,
            defender_core_min_distance: 225.0,
            max_adjust_distance: 80,
            sanctuary_radius: 70,
            guaranteed_sanctuary_s: 10 * 60,
            hazard_damage_flat: 55.0 / 60.0,
            hazard_damage_percent: 1.8 / 100.0 / 60.0,
            min_priced_amount: 500,
            guaranteed_harmonic_factor: 15.0,
            per_core_capacity: 4000,
            ramp_up_core_count: 3,
            harmonic_count_power: 0.6,
            base_cost: ResourceBundle::of(&[
                (Resource::Uranium, 1000),
                (Resource::Fiber, 200),
            ]),
            shared_base_cost: ResourceBundle::of(&[
                (Resource::Polymer, 400),
                (Resource::Silicon, 300),
                (Resource::Copper, 1000),
                (Resource::Lead, 200),
            ]),
            per_core_cost: ResourceBundle::of(&[
                (Resource::Polymer, 200),
                (Resource::Uranium, 500),
                (Resource::Fiber, 1000),
                (Resource::Silicon, 1000),
                (Resource::Copper, 500),
                (Resource::Lead, 100),
            ]),
            harmonic_cost: ResourceBundle::of(&[
                (Resource::Fiber, 50),
                (Resource::Silicon, 250),
                (Resource::Catalyst, 150),
            ]),
            attacker_loadout: ResourceBundle::of(&[
                (Resource::Copper, 3600),
                (Resource::Lead, 3600),
                (Resource::Graphite, 600),
                (Resource::Titanium, 800),
                (Resource::Silicon, 500),
                (Resource::Glass, 600),
            ]),
            defender_loadout: ResourceBundle::of(&[
                (Resource::Copper, 500),
                (Resource::Lead, 300),
            ]),
            depot_tap_debounce_ms: 200,
        }
    }
}
