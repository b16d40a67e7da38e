pub mod median;
pub mod solver;

pub use median::geometric_median;
pub use solver::{resolve_core_placement, PlacementResolution};
