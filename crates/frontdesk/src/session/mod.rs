//! Chat sessions: the per-conversation record and the in-memory store.

mod store;

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

pub use store::{SESSION_TTL_SECS, SWEEP_EVERY_CREATIONS, SessionStore};

/// Where a session stands relative to its turn budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting substantive turns.
    Active,
    /// The turn budget is used up but the session has not been closed yet.
    Terminating,
    /// Closed; every further message gets the fixed notice.
    Ended,
}

/// One conversation's state.
///
/// The router works on an owned copy taken from [`SessionStore::get_or_create`] and
/// writes it back with [`SessionStore::commit`].
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    /// Substantive turns taken. Never decreases.
    pub turns: u32,
    /// Most recent turn texts, oldest first.
    transcript: VecDeque<String>,
    /// Some recorded turn matched a domain keyword. Survives the transcript
    /// window, never cleared.
    pub on_topic: bool,
    /// Once set, never cleared.
    pub ended: bool,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            turns: 0,
            transcript: VecDeque::new(),
            on_topic: false,
            ended: false,
            last_activity: now,
        }
    }

    /// Count one turn and remember its text, keeping only the last `max_turns`
    /// entries. Does nothing once the session has ended.
    pub fn record_turn(&mut self, text: &str, max_turns: u32) {
        if self.ended {
            return;
        }
        self.turns = self.turns.saturating_add(1);
        self.transcript.push_back(text.to_string());

        let window = max_turns.max(1) as usize;
        while self.transcript.len() > window {
            self.transcript.pop_front();
        }
    }

    /// Latch the on-topic flag.
    pub fn mark_on_topic(&mut self) {
        self.on_topic = true;
    }

    pub fn end(&mut self) {
        self.ended = true;
    }

    pub fn transcript(&self) -> impl Iterator<Item = &str> {
        self.transcript.iter().map(String::as_str)
    }

    pub fn transcript_len(&self) -> usize {
        self.transcript.len()
    }

    /// Turns left before the session closes; zero once ended.
    pub fn remaining(&self, max_turns: u32) -> u32 {
        if self.ended {
            0
        } else {
            max_turns.saturating_sub(self.turns)
        }
    }

    pub fn state(&self, max_turns: u32) -> SessionState {
        if self.ended {
            SessionState::Ended
        } else if self.turns >= max_turns {
            SessionState::Terminating
        } else {
            SessionState::Active
        }
    }
}
