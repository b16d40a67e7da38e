//! Persistent participant identity
//!
//! Records are keyed by the host's stable token and survive reconnects:
//! lookup-or-create is idempotent, and nothing is ever destroyed mid-match.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{ClickAction, ParticipantToken};

/// One participant's persistent record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub token: ParticipantToken,
    pub online: bool,
    /// Last time the participant was connected
    pub last_seen_ms: i64,
    /// Last time the participant did anything observable
    pub last_active_ms: i64,
    /// Pending click action, overwritten by new input and consumed on use
    pub click_action: Option<ClickAction>,
    /// Debounces double-fired depot activation events
    pub last_core_attempt_ms: i64,
}

#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    records: AHashMap<ParticipantToken, Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the record for a token, creating it on first contact.
    pub fn lookup_or_create(&mut self, token: ParticipantToken, now_ms: i64) -> &mut Participant {
        self.records.entry(token).or_insert_with(|| Participant {
            token,
            online: true,
            last_seen_ms: now_ms,
            last_active_ms: now_ms,
            click_action: None,
            last_core_attempt_ms: i64::MIN,
        })
    }

    pub fn get(&self, token: ParticipantToken) -> Option<&Participant> {
        self.records.get(&token)
    }

    pub fn get_mut(&mut self, token: ParticipantToken) -> Option<&mut Participant> {
        self.records.get_mut(&token)
    }

    pub fn set_online(&mut self, token: ParticipantToken, online: bool, now_ms: i64) {
        let record = self.lookup_or_create(token, now_ms);
        record.online = online;
        record.last_seen_ms = now_ms;
    }

    pub fn mark_seen(&mut self, token: ParticipantToken, now_ms: i64) {
        if let Some(record) = self.records.get_mut(&token) {
            record.last_seen_ms = now_ms;
        }
    }

    pub fn mark_active(&mut self, token: ParticipantToken, now_ms: i64) {
        if let Some(record) = self.records.get_mut(&token) {
            record.last_active_ms = now_ms;
        }
    }

    /// Takes the pending click action, clearing it.
    pub fn take_click_action(&mut self, token: ParticipantToken) -> Option<ClickAction> {
        self.records.get_mut(&token)?.click_action.take()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.records.values()
    }
}
