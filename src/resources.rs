//! Resource kinds and bundle arithmetic
//!
//! A [`ResourceBundle`] serves double duty: as a cost (possibly holding
//! negative correction amounts while a price is being assembled) and as a
//! storage inventory (depot contents, faction shared storage).

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A transportable resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Copper,
    Lead,
    Graphite,
    Titanium,
    Silicon,
    Glass,
    Polymer,
    Uranium,
    Fiber,
    Catalyst,
}

impl Resource {
    /// All resource kinds, in canonical display order
    pub const ALL: [Resource; 10] = [
        Resource::Copper,
        Resource::Lead,
        Resource::Graphite,
        Resource::Titanium,
        Resource::Silicon,
        Resource::Glass,
        Resource::Polymer,
        Resource::Uranium,
        Resource::Fiber,
        Resource::Catalyst,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Copper => "copper",
            Resource::Lead => "lead",
            Resource::Graphite => "graphite",
            Resource::Titanium => "titanium",
            Resource::Silicon => "silicon",
            Resource::Glass => "glass",
            Resource::Polymer => "polymer",
            Resource::Uranium => "uranium",
            Resource::Fiber => "fiber",
            Resource::Catalyst => "catalyst",
        }
    }
}

/// An unordered collection of resource amounts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceBundle {
    amounts: AHashMap<Resource, i64>,
}

impl ResourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(pairs: &[(Resource, i64)]) -> Self {
        let mut bundle = Self::new();
        for &(resource, amount) in pairs {
            bundle.add(resource, amount);
        }
        bundle
    }

    pub fn get(&self, resource: Resource) -> i64 {
        self.amounts.get(&resource).copied().unwrap_or(0)
    }

    /// Add an amount (may be negative) for one resource
    pub fn add(&mut self, resource: Resource, amount: i64) {
        *self.amounts.entry(resource).or_insert(0) += amount;
    }

    /// Add every amount of another bundle into this one
    pub fn merge(&mut self, other: &ResourceBundle) {
        for (&resource, &amount) in &other.amounts {
            self.add(resource, amount);
        }
    }

    /// A copy of this bundle with every amount multiplied by `factor`,
    /// truncated toward zero
    pub fn scaled(&self, factor: f64) -> ResourceBundle {
        let mut scaled = ResourceBundle::new();
        for (&resource, &amount) in &self.amounts {
            scaled.add(resource, (amount as f64 * factor) as i64);
        }
        scaled
    }

    /// Whether this store covers every positive amount of `cost`
    pub fn covers(&self, cost: &ResourceBundle) -> bool {
        cost.amounts
            .iter()
            .all(|(&resource, &amount)| self.get(resource) >= amount)
    }

    /// The amounts of `cost` this store cannot pay. Empty when covered.
    pub fn missing(&self, cost: &ResourceBundle) -> ResourceBundle {
        let mut missing = ResourceBundle::new();
        for (&resource, &amount) in &cost.amounts {
            let shortfall = amount - self.get(resource);
            if shortfall > 0 {
                missing.add(resource, shortfall);
            }
        }
        missing
    }

    /// Remove `cost` from this store. Fails without modification if any
    /// amount is not covered; there is never a partial debit.
    pub fn debit(&mut self, cost: &ResourceBundle) -> bool {
        if !self.covers(cost) {
            return false;
        }
        for (&resource, &amount) in &cost.amounts {
            self.add(resource, -amount);
        }
        true
    }

    /// Empty this bundle, returning its former contents
    pub fn drain(&mut self) -> ResourceBundle {
        ResourceBundle { amounts: std::mem::take(&mut self.amounts) }
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.values().all(|&amount| amount == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, i64)> + '_ {
        self.amounts.iter().map(|(&resource, &amount)| (resource, amount))
    }
}

impl std::fmt::Display for ResourceBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for resource in Resource::ALL {
            let amount = self.get(resource);
            if amount == 0 {
                continue;
            }
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", amount, resource.name())?;
            first = false;
        }
        if first {
            write!(f, "nothing")?;
        }
        Ok(())
    }
}
