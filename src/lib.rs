//! Redoubt - Territory-Control Match Simulation Core

pub mod core;
pub mod faction;
pub mod hazard;
pub mod host;
pub mod mediator;
pub mod placement;
pub mod pricing;
pub mod resources;
pub mod sanctuary;
pub mod scheduler;
pub mod testkit;
