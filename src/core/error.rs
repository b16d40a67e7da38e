use thiserror::Error;

use crate::core::types::FactionId;
use crate::resources::ResourceBundle;

/// Reasons a placement attempt is rejected by the pre-commit hook.
/// These are structured so the host can relay machine-checkable denials.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("the match has not started")]
    MatchNotStarted,

    #[error("neutral participants cannot build")]
    NeutralBuilder,

    #[error("target footprint overlaps the hazard field")]
    InsideHazard,

    #[error("target footprint is out of bounds")]
    OutOfBounds,

    #[error("target terrain is not placeable")]
    NotPlaceable,

    #[error("defenders cannot build turrets inside the active sanctuary")]
    TurretInSanctuary,

    #[error("cores cannot anchor on guaranteed-safe ground")]
    SafeGroundCore,
}

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("illegal placement: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("insufficient resources: missing {missing}")]
    InsufficientResources { missing: ResourceBundle },

    #[error("no viable core location within {max_radius} cells for faction {faction:?}")]
    PlacementUnresolvable { faction: FactionId, max_radius: i32 },

    #[error("faction {faction:?} eliminated by timeout: {reason}")]
    TimeoutElimination { faction: FactionId, reason: &'static str },

    #[error("cannot take the geometric median of zero points")]
    EmptyPointSet,

    #[error("internal inconsistency: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, MatchError>;
