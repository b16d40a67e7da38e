//! Faction lifecycle: formation, membership, votekicks, elimination
//!
//! Exactly one Defender faction exists for the whole match; Attacker
//! factions are formed on request during setup and destroyed on empty
//! membership, elimination, or timeout. A participant belongs to at most
//! one Attacker faction.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::config::MatchConfig;
use crate::core::types::{FactionId, FactionKind, ParticipantToken};
use crate::faction::participant::ParticipantRegistry;
use crate::faction::votekick::{Ballot, Votekick};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub kind: FactionKind,
    pub members: Vec<ParticipantToken>,
    /// Open factions admit any join request immediately
    pub open: bool,
    pub join_requests: Vec<ParticipantToken>,
    pub invitations: Vec<ParticipantToken>,
    pub votekick: Option<Votekick>,
    /// Engine-level team id, assigned when placement opens
    pub engine_team: Option<u32>,
    /// Color-derived display label, assigned with the engine team
    pub label: Option<String>,
}

impl Faction {
    fn new(id: FactionId, kind: FactionKind) -> Self {
        Self {
            id,
            kind,
            members: Vec::new(),
            open: false,
            join_requests: Vec::new(),
            invitations: Vec::new(),
            votekick: None,
            engine_team: None,
            label: None,
        }
    }

    pub fn is_member(&self, token: ParticipantToken) -> bool {
        self.members.contains(&token)
    }
}

/// Outcome of a join or invite attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// The participant is now a member
    Admitted,
    /// Queued until the counterpart reciprocates
    Queued,
    /// The faction is at capacity
    Full,
    /// The participant already belongs to an Attacker faction
    AlreadyMember,
    /// No such faction
    NoSuchFaction,
}

/// Resolution events produced by the per-tick sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactionEvent {
    VotekickPassed {
        faction: FactionId,
        target: ParticipantToken,
    },
    VotekickFailed {
        faction: FactionId,
        target: ParticipantToken,
    },
    Disbanded {
        faction: FactionId,
    },
}

#[derive(Debug)]
pub struct FactionRegistry {
    factions: Vec<Faction>,
    max_members: usize,
}

impl FactionRegistry {
    /// Creates the registry with the single Defender faction in place.
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            factions: vec![Faction::new(FactionId::DEFENDER, FactionKind::Defender)],
            max_members: config.max_faction_members,
        }
    }

    pub fn get(&self, id: FactionId) -> Option<&Faction> {
        self.factions.iter().find(|f| f.id == id)
    }

    pub fn get_mut(&mut self, id: FactionId) -> Option<&mut Faction> {
        self.factions.iter_mut().find(|f| f.id == id)
    }

    pub fn defender(&self) -> &Faction {
        // Constructed with the Defender and never removes it
        &self.factions[0]
    }

    pub fn attackers(&self) -> impl Iterator<Item = &Faction> {
        self.factions
            .iter()
            .filter(|f| f.kind == FactionKind::Attacker)
    }

    pub fn attacker_count(&self) -> usize {
        self.attackers().count()
    }

    pub fn attacker_ids(&self) -> Vec<FactionId> {
        self.attackers().map(|f| f.id).collect()
    }

    /// Faction the participant currently belongs to, if any.
    pub fn faction_of(&self, token: ParticipantToken) -> Option<FactionId> {
        self.factions
            .iter()
            .find(|f| f.is_member(token))
            .map(|f| f.id)
    }

    /// Forms a new Attacker faction with the founder as sole member,
    /// assigning the smallest unused positive id. Fails if the founder is
    /// already in an Attacker faction.
    pub fn form_attacker(&mut self, founder: ParticipantToken) -> Option<FactionId> {
        if self.attacker_of(founder).is_some() {
            return None;
        }
        let mut raw = 1u32;
        while self.factions.iter().any(|f| f.id.0 == raw) {
            raw += 1;
        }
        let id = FactionId(raw);
        let mut faction = Faction::new(id, FactionKind::Attacker);
        faction.members.push(founder);
        self.remove_pending(founder);
        self.factions.push(faction);
        info!(faction = raw, "attacker faction formed");
        Some(id)
    }

    fn attacker_of(&self, token: ParticipantToken) -> Option<FactionId> {
        self.faction_of(token)
            .filter(|id| !id.is_defender())
    }

    /// A participant asks to join a faction. Accepted immediately when the
    /// faction is open or has already invited them; queued otherwise.
    pub fn request_join(&mut self, token: ParticipantToken, id: FactionId) -> AdmissionOutcome {
        if self.attacker_of(token).is_some() {
            return AdmissionOutcome::AlreadyMember;
        }
        let max = self.max_members;
        let Some(faction) = self.get_mut(id) else {
            return AdmissionOutcome::NoSuchFaction;
        };
        if faction.members.len() >= max {
            return AdmissionOutcome::Full;
        }
        if faction.open || faction.invitations.contains(&token) {
            faction.invitations.retain(|t| *t != token);
            faction.members.push(token);
            self.remove_pending(token);
            return AdmissionOutcome::Admitted;
        }
        if !faction.join_requests.contains(&token) {
            faction.join_requests.push(token);
        }
        AdmissionOutcome::Queued
    }

    /// A faction invites a participant. Accepted immediately when the
    /// participant already has a pending request for this faction.
    pub fn invite(&mut self, id: FactionId, target: ParticipantToken) -> AdmissionOutcome {
        if self.attacker_of(target).is_some() {
            return AdmissionOutcome::AlreadyMember;
        }
        let max = self.max_members;
        let Some(faction) = self.get_mut(id) else {
            return AdmissionOutcome::NoSuchFaction;
        };
        if faction.members.len() >= max {
            return AdmissionOutcome::Full;
        }
        if faction.join_requests.contains(&target) {
            faction.join_requests.retain(|t| *t != target);
            faction.members.push(target);
            self.remove_pending(target);
            return AdmissionOutcome::Admitted;
        }
        if !faction.invitations.contains(&target) {
            faction.invitations.push(target);
        }
        AdmissionOutcome::Queued
    }

    /// Drops the participant's pending requests and invitations everywhere
    /// once they land in a faction.
    fn remove_pending(&mut self, token: ParticipantToken) {
        for faction in &mut self.factions {
            faction.join_requests.retain(|t| *t != token);
            faction.invitations.retain(|t| *t != token);
        }
    }

    /// Removes the participant from their faction. Returns the id of a
    /// disbanded faction if the departure emptied it.
    pub fn quit(&mut self, token: ParticipantToken) -> Option<FactionId> {
        let id = self.faction_of(token)?;
        let faction = self.get_mut(id)?;
        faction.members.retain(|t| *t != token);
        if faction.members.is_empty() && !id.is_defender() {
            self.disband(id);
            return Some(id);
        }
        None
    }

    fn disband(&mut self, id: FactionId) {
        self.factions.retain(|f| f.id != id);
        info!(faction = id.0, "faction disbanded");
    }

    /// Removes an Attacker faction outright (elimination, timeout),
    /// returning its former members.
    pub fn eliminate(&mut self, id: FactionId) -> Vec<ParticipantToken> {
        let Some(pos) = self.factions.iter().position(|f| f.id == id && !id.is_defender()) else {
            return Vec::new();
        };
        let faction = self.factions.remove(pos);
        info!(faction = id.0, "faction eliminated");
        faction.members
    }

    /// Starts a removal vote against a member. Only one vote may run per
    /// faction. The vote opens with no ballots cast; the initiator votes
    /// like everyone else.
    pub fn start_votekick(
        &mut self,
        id: FactionId,
        initiator: ParticipantToken,
        target: ParticipantToken,
        now_ms: i64,
        duration_ms: i64,
    ) -> bool {
        let Some(faction) = self.get_mut(id) else {
            return false;
        };
        if faction.votekick.is_some()
            || !faction.is_member(initiator)
            || !faction.is_member(target)
            || initiator == target
        {
            return false;
        }
        faction.votekick = Some(Votekick::new(target, now_ms, duration_ms / 1_000));
        true
    }

    pub fn cast_vote(&mut self, id: FactionId, voter: ParticipantToken, ballot: Ballot) -> bool {
        let Some(faction) = self.get_mut(id) else {
            return false;
        };
        if !faction.is_member(voter) {
            return false;
        }
        match &mut faction.votekick {
            Some(vote) => {
                vote.cast(voter, ballot);
                true
            }
            None => false,
        }
    }

    /// Per-tick sweep: resolves settled votekicks. A passed vote removes
    /// the target and relocates them to the Defender faction; either way
    /// the vote state resets. Emits events for the scheduler to announce.
    pub fn tick(&mut self, now_ms: i64) -> Vec<FactionEvent> {
        let mut events = Vec::new();
        let ids: Vec<FactionId> = self.factions.iter().map(|f| f.id).collect();
        for id in ids {
            let Some(faction) = self.get_mut(id) else {
                continue;
            };
            let Some(vote) = &faction.votekick else {
                continue;
            };
            let Some(passed) = vote.tally(faction.members.len(), now_ms) else {
                continue;
            };
            let target = vote.target;
            faction.votekick = None;
            if passed {
                faction.members.retain(|t| *t != target);
                let emptied = faction.members.is_empty() && !id.is_defender();
                self.defender_mut().members.push(target);
                events.push(FactionEvent::VotekickPassed {
                    faction: id,
                    target,
                });
                if emptied {
                    self.disband(id);
                    events.push(FactionEvent::Disbanded { faction: id });
                }
            } else {
                events.push(FactionEvent::VotekickFailed {
                    faction: id,
                    target,
                });
            }
        }

        // Reap emptied Attacker factions that slipped past the mutation
        // paths (host-side disconnect cleanup can empty one mid-tick)
        let empty: Vec<FactionId> = self
            .attackers()
            .filter(|f| f.members.is_empty())
            .map(|f| f.id)
            .collect();
        for id in empty {
            self.disband(id);
            events.push(FactionEvent::Disbanded { faction: id });
        }
        events
    }

    fn defender_mut(&mut self) -> &mut Faction {
        &mut self.factions[0]
    }

    /// Joins the Defender faction directly (always open, uncapped).
    pub fn join_defender(&mut self, token: ParticipantToken) {
        if self.faction_of(token).is_none() {
            self.defender_mut().members.push(token);
        }
    }

    /// Milliseconds since every member of the faction was last connected.
    /// Zero while any member is online.
    pub fn time_offline(
        &self,
        id: FactionId,
        participants: &ParticipantRegistry,
        now_ms: i64,
    ) -> i64 {
        let Some(faction) = self.get(id) else {
            return 0;
        };
        let mut latest = i64::MIN;
        for token in &faction.members {
            if let Some(record) = participants.get(*token) {
                if record.online {
                    return 0;
                }
                latest = latest.max(record.last_seen_ms);
            }
        }
        if latest == i64::MIN {
            0
        } else {
            now_ms - latest
        }
    }

    /// Milliseconds since any member of the faction last did anything.
    pub fn time_idle(
        &self,
        id: FactionId,
        participants: &ParticipantRegistry,
        now_ms: i64,
    ) -> i64 {
        let Some(faction) = self.get(id) else {
            return 0;
        };
        let mut latest = i64::MIN;
        for token in &faction.members {
            if let Some(record) = participants.get(*token) {
                latest = latest.max(record.last_active_ms);
            }
        }
        if latest == i64::MIN {
            0
        } else {
            now_ms - latest
        }
    }
}
