//! Dynamic multi-resource core pricing
//!
//! A depot converts into a core for two payments: a fixed bundle taken from
//! the depot's own inventory, and a shared-storage bundle that grows with
//! the faction's existing cores and with the harmonic distance factor.
//! Building far from the faction's territory is expensive; a guaranteed cap
//! keeps the price payable from what the existing cores could store, and a
//! ramp-up divisor reshapes the first few core prices.
//!
//! All of this is stateless arithmetic over the structure registry; commit
//! is the only operation that mutates storage, and it never debits
//! partially.

use serde::{Deserialize, Serialize};

use crate::core::config::MatchConfig;
use crate::core::error::{MatchError, Result};
use crate::core::types::{CellPos, CoreStructure};
use crate::resources::ResourceBundle;

/// Price of converting one depot into a base-tier core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreQuote {
    /// Payable only from the initiating depot's own inventory
    pub depot_cost: ResourceBundle,
    /// Payable from the faction's shared storage
    pub shared_cost: ResourceBundle,
}

/// Harmonic distance factor: `count^power / Σ 1/sqrt(d² + 1)` over the
/// faction's existing cores. Fewer cores inflate it; so does building far
/// from all of them. Zero cores yield zero (the cap absorbs the price).
pub fn harmonic_factor(depot_cell: CellPos, cores: &[CoreStructure], config: &MatchConfig) -> f64 {
    if cores.is_empty() {
        return 0.0;
    }
    let mut divisor = 0.0f64;
    for core in cores {
        let dx = (depot_cell.x - core.pos.x) as f64;
        let dy = (depot_cell.y - core.pos.y) as f64;
        divisor += 1.0 / (dx * dx + dy * dy + 1.0).sqrt();
    }
    (cores.len() as f64).powf(config.harmonic_count_power) / divisor
}

/// Computes the full price of a depot-to-core conversion against the
/// faction's existing cores. Pure; commits nothing.
pub fn quote_core(
    depot_cell: CellPos,
    cores: &[CoreStructure],
    config: &MatchConfig,
) -> CoreQuote {
    let count = cores.len();

    // Constant shared bundle plus the per-core surcharge
    let mut shared = config.shared_base_cost.clone();
    for _ in 0..count {
        shared.merge(&config.per_core_cost);
    }

    // Guaranteed cap: price the bundle at the guaranteed harmonic constant
    // and subtract whatever exceeds what the existing cores could store.
    // Applied before the ramp-up divisor.
    let mut guaranteed = shared.clone();
    guaranteed.merge(&config.harmonic_cost.scaled(config.guaranteed_harmonic_factor));
    let capacity = count as i64 * config.per_core_capacity;
    let mut subtraction = ResourceBundle::new();
    for (resource, amount) in guaranteed.iter() {
        if amount > capacity {
            subtraction.add(resource, -(amount - capacity));
        }
    }

    shared.merge(
        &config
            .harmonic_cost
            .scaled(harmonic_factor(depot_cell, cores, config)),
    );
    shared.merge(&subtraction);

    // Discard trivial amounts, then apply the ramp-up divisor
    let mut adjusted = ResourceBundle::new();
    for (resource, amount) in shared.iter() {
        if amount < config.min_priced_amount {
            continue;
        }
        let mut amount = amount;
        if count > 0 && count < config.ramp_up_core_count {
            let ratio = count as f64 / config.ramp_up_core_count as f64;
            amount = (amount as f64 / ratio).ceil() as i64;
        }
        adjusted.add(resource, amount);
    }

    CoreQuote {
        depot_cost: config.base_cost.clone(),
        shared_cost: adjusted,
    }
}

/// Verifies both payments and performs the debit. The depot's leftover
/// contents (everything beyond the depot cost) pour into shared storage as
/// the depot becomes a core; the leftover is returned for reporting.
///
/// On any shortfall the exact missing bundle is reported and neither store
/// is touched.
pub fn commit_core(
    quote: &CoreQuote,
    depot_contents: &ResourceBundle,
    shared_storage: &mut ResourceBundle,
) -> Result<ResourceBundle> {
    if !depot_contents.covers(&quote.depot_cost) {
        return Err(MatchError::InsufficientResources {
            missing: depot_contents.missing(&quote.depot_cost),
        });
    }
    if !shared_storage.covers(&quote.shared_cost) {
        return Err(MatchError::InsufficientResources {
            missing: shared_storage.missing(&quote.shared_cost),
        });
    }

    let mut leftover = depot_contents.clone();
    leftover.debit(&quote.depot_cost);
    shared_storage.merge(&leftover);
    shared_storage.debit(&quote.shared_cost);
    Ok(leftover)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CoreTier, FactionId, StructureId};
    use crate::resources::Resource;

    fn core_at(id: u64, x: i32, y: i32) -> CoreStructure {
        CoreStructure {
            id: StructureId(id),
            tier: CoreTier::Outpost,
            pos: CellPos::new(x, y),
            faction: FactionId(1),
        }
    }

    #[test]
    fn test_zero_cores_pay_depot_cost_only() {
        let config = MatchConfig::default();
        let quote = quote_core(CellPos::new(100, 100), &[], &config);
        assert_eq!(quote.depot_cost, config.base_cost);
        // With no cores there is no storage, so the guaranteed cap absorbs
        // the entire shared bundle
        assert!(quote.shared_cost.is_empty(), "got {}", quote.shared_cost);
    }

    #[test]
    fn test_harmonic_factor_shrinks_with_core_count() {
        let config = MatchConfig::default();
        let depot = CellPos::new(0, 0);
        let one = harmonic_factor(depot, &[core_at(1, 100, 0)], &config);
        let two = harmonic_factor(
            depot,
            &[core_at(1, 100, 0), core_at(2, 0, 100)],
            &config,
        );
        assert!(two < one, "two cores {} should price below one {}", two, one);
    }

    #[test]
    fn test_harmonic_factor_grows_with_distance() {
        let config = MatchConfig::default();
        let depot = CellPos::new(0, 0);
        let near = harmonic_factor(depot, &[core_at(1, 50, 0)], &config);
        let far = harmonic_factor(depot, &[core_at(1, 300, 0)], &config);
        assert!(far > near);
    }

    #[test]
    fn test_ramp_up_never_cheaper_than_mature_rate() {
        let config = MatchConfig::default();
        let depot = CellPos::new(0, 0);
        // Copper sits below the guaranteed cap at these counts, so only the
        // per-core surcharge and the ramp divisor move it
        let one = quote_core(depot, &[core_at(1, 100, 0)], &config);
        assert_eq!(one.shared_cost.get(Resource::Copper), (1000 + 500) * 3);

        let two_cores = [core_at(1, 100, 0), core_at(2, 0, 100)];
        let two = quote_core(depot, &two_cores, &config);
        // (1000 + 2*500) * 3/2
        assert_eq!(two.shared_cost.get(Resource::Copper), 3000);
    }

    #[test]
    fn test_min_threshold_discards_small_amounts() {
        let config = MatchConfig::default();
        let quote = quote_core(CellPos::new(0, 0), &[core_at(1, 100, 0)], &config);
        // Lead never reaches 500 before the ramp divisor applies
        assert_eq!(quote.shared_cost.get(Resource::Lead), 0);
    }

    #[test]
    fn test_guaranteed_cap_limits_silicon() {
        let capped = MatchConfig::default();
        let uncapped = MatchConfig {
            per_core_capacity: i64::MAX / 4,
            ..MatchConfig::default()
        };
        let cores = [core_at(1, 100, 0)];
        let depot = CellPos::new(0, 0);

        let with_cap = quote_core(depot, &cores, &capped);
        let without_cap = quote_core(depot, &cores, &uncapped);
        assert!(
            with_cap.shared_cost.get(Resource::Silicon)
                < without_cap.shared_cost.get(Resource::Silicon)
        );
        // Amounts under the cap are untouched by it
        assert_eq!(
            with_cap.shared_cost.get(Resource::Copper),
            without_cap.shared_cost.get(Resource::Copper)
        );
    }

    #[test]
    fn test_commit_reports_missing_without_debit() {
        let quote = CoreQuote {
            depot_cost: ResourceBundle::of(&[(Resource::Uranium, 1000)]),
            shared_cost: ResourceBundle::of(&[(Resource::Copper, 3000)]),
        };
        let depot = ResourceBundle::of(&[(Resource::Uranium, 1000)]);
        let mut storage = ResourceBundle::of(&[(Resource::Copper, 1200)]);

        match commit_core(&quote, &depot, &mut storage) {
            Err(MatchError::InsufficientResources { missing }) => {
                assert_eq!(missing.get(Resource::Copper), 1800);
            }
            other => panic!("expected shortfall, got {:?}", other.map(|b| b.to_string())),
        }
        // No partial debit
        assert_eq!(storage.get(Resource::Copper), 1200);
    }

    #[test]
    fn test_commit_debits_and_pours_leftover() {
        let quote = CoreQuote {
            depot_cost: ResourceBundle::of(&[(Resource::Uranium, 1000)]),
            shared_cost: ResourceBundle::of(&[(Resource::Copper, 3000)]),
        };
        let depot = ResourceBundle::of(&[(Resource::Uranium, 1200), (Resource::Glass, 80)]);
        let mut storage = ResourceBundle::of(&[(Resource::Copper, 5000)]);

        let leftover = commit_core(&quote, &depot, &mut storage).unwrap();
        assert_eq!(leftover.get(Resource::Uranium), 200);
        assert_eq!(leftover.get(Resource::Glass), 80);
        assert_eq!(storage.get(Resource::Copper), 2000);
        assert_eq!(storage.get(Resource::Uranium), 200);
        assert_eq!(storage.get(Resource::Glass), 80);
    }
}
