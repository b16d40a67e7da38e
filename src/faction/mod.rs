//! Faction and participant lifecycle

pub mod participant;
pub mod registry;
pub mod votekick;

pub use participant::{Participant, ParticipantRegistry};
pub use registry::{AdmissionOutcome, Faction, FactionEvent, FactionRegistry};
pub use votekick::{Ballot, Votekick};
