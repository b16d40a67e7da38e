pub mod field;

pub use field::{HazardField, UPDATE_DIVISIONS};
