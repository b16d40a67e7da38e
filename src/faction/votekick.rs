//! Quorum-based removal votes
//!
//! One vote may run per faction at a time. The vote resolves early the
//! moment the outcome is mathematically determined; otherwise it resolves
//! by simple majority at the deadline, with abstainers and non-voters
//! excluded from the decisive comparison.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::types::ParticipantToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ballot {
    Yes,
    No,
    Abstain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Votekick {
    pub target: ParticipantToken,
    pub deadline_ms: i64,
    yes: AHashSet<ParticipantToken>,
    no: AHashSet<ParticipantToken>,
    abstain: AHashSet<ParticipantToken>,
}

impl Votekick {
    pub fn new(target: ParticipantToken, now_ms: i64, duration_s: i64) -> Self {
        Self {
            target,
            deadline_ms: now_ms + duration_s * 1_000,
            yes: AHashSet::new(),
            no: AHashSet::new(),
            abstain: AHashSet::new(),
        }
    }

    /// Records a ballot, replacing any earlier one from the same voter.
    pub fn cast(&mut self, voter: ParticipantToken, ballot: Ballot) {
        self.yes.remove(&voter);
        self.no.remove(&voter);
        self.abstain.remove(&voter);
        match ballot {
            Ballot::Yes => self.yes.insert(voter),
            Ballot::No => self.no.insert(voter),
            Ballot::Abstain => self.abstain.insert(voter),
        };
    }

    pub fn has_voted(&self, voter: ParticipantToken) -> bool {
        self.yes.contains(&voter) || self.no.contains(&voter) || self.abstain.contains(&voter)
    }

    /// Resolves the vote if its outcome is settled. `member_count` is the
    /// faction's full membership including the target. Returns
    /// `Some(passed)` once decided, `None` while still open.
    pub fn tally(&self, member_count: usize, now_ms: i64) -> Option<bool> {
        let yes = self.yes.len();
        let no = self.no.len();
        let decided = yes + no + self.abstain.len();
        let undecided = member_count.saturating_sub(decided);

        if now_ms >= self.deadline_ms {
            return Some(yes > no);
        }
        if yes > no + undecided {
            return Some(true);
        }
        if no > yes + undecided {
            return Some(false);
        }
        None
    }
}
