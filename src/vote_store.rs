//! In-memory store of voting sessions
//!
//! Each session is keyed by the inline query id that created it and holds
//! the question text, its creation time, and the voters for every choice.
//! A user holds at most one choice per session; voting again moves them.
//!
//! ```rust
//! use vote_bot::vote_store::{ChoiceLabel, VoteStore, VoterRecord};
//!
//! let store = VoteStore::new();
//! store.create_session("q1", "Pizza night?");
//! let vote = store
//!     .register_vote("q1", ChoiceLabel::Red, VoterRecord::new(1, Some("alice"), "Alice"))
//!     .unwrap();
//! assert_eq!(vote.text, "Pizza night?\n\n❤️: @alice\n");
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::errors::{AppError, AppResult};
use crate::rendering::render_session_text;

/// One of the vote categories offered on the keyboard
///
/// Labels outside the fixed set can only arrive through hand-crafted
/// callback data; they are kept verbatim and rendered without a glyph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChoiceLabel {
    Red,
    Yellow,
    Blue,
    Envelope,
    Unlisted(String),
}

impl ChoiceLabel {
    /// The closed set shown on the keyboard, in button order
    pub const KEYBOARD: [ChoiceLabel; 4] = [
        ChoiceLabel::Red,
        ChoiceLabel::Yellow,
        ChoiceLabel::Blue,
        ChoiceLabel::Envelope,
    ];

    /// Wire name used in callback data
    pub fn as_str(&self) -> &str {
        match self {
            ChoiceLabel::Red => "vote_red",
            ChoiceLabel::Yellow => "vote_yellow",
            ChoiceLabel::Blue => "vote_blue",
            ChoiceLabel::Envelope => "vote_envelope",
            ChoiceLabel::Unlisted(raw) => raw,
        }
    }

    /// Display glyph, or the raw label when it has none
    pub fn glyph(&self) -> &str {
        match self {
            ChoiceLabel::Red => "❤️",
            ChoiceLabel::Yellow => "💛",
            ChoiceLabel::Blue => "💙",
            ChoiceLabel::Envelope => "💌",
            ChoiceLabel::Unlisted(raw) => raw,
        }
    }
}

impl From<&str> for ChoiceLabel {
    fn from(label: &str) -> Self {
        match label {
            "vote_red" => ChoiceLabel::Red,
            "vote_yellow" => ChoiceLabel::Yellow,
            "vote_blue" => ChoiceLabel::Blue,
            "vote_envelope" => ChoiceLabel::Envelope,
            other => ChoiceLabel::Unlisted(other.to_string()),
        }
    }
}

impl std::fmt::Display for ChoiceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user who cast a vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterRecord {
    /// Telegram user id, the equality key for exclusivity
    pub user_id: u64,
    /// Public @handle without the leading `@`
    pub username: Option<String>,
    /// First and last name, used when there is no handle
    pub full_name: String,
}

impl VoterRecord {
    pub fn new(user_id: u64, username: Option<&str>, full_name: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.map(str::to_string),
            full_name: full_name.into(),
        }
    }

    /// Build a record from the name parts Telegram sends
    pub fn from_name_parts(
        user_id: u64,
        username: Option<&str>,
        first_name: &str,
        last_name: Option<&str>,
    ) -> Self {
        let full_name = format!("{} {}", first_name, last_name.unwrap_or(""))
            .trim()
            .to_string();
        Self::new(user_id, username, full_name)
    }
}

/// One voting round
#[derive(Debug, Clone, PartialEq)]
pub struct VotingSession {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Voters per choice. Choices are ordered by the first vote they got
    /// since they were last empty, voters by arrival. Never holds an empty list.
    pub votes: Vec<(ChoiceLabel, Vec<VoterRecord>)>,
}

impl VotingSession {
    fn new(id: String, title: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            created_at,
            votes: Vec::new(),
        }
    }

    /// The choice currently held by `user_id`, if any
    pub fn choice_of(&self, user_id: u64) -> Option<&ChoiceLabel> {
        self.votes
            .iter()
            .find(|(_, voters)| voters.iter().any(|v| v.user_id == user_id))
            .map(|(label, _)| label)
    }

    /// Total number of voters across all choices
    pub fn voter_count(&self) -> usize {
        self.votes.iter().map(|(_, voters)| voters.len()).sum()
    }

    /// Voters currently holding `label`
    pub fn voters_for(&self, label: &ChoiceLabel) -> Option<&[VoterRecord]> {
        self.votes
            .iter()
            .find(|(held, _)| held == label)
            .map(|(_, voters)| voters.as_slice())
    }

    fn is_older_than(&self, retention: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > retention
    }

    fn apply_vote(&mut self, label: ChoiceLabel, voter: VoterRecord) {
        if self.choice_of(voter.user_id) == Some(&label) {
            return;
        }

        for (_, voters) in self.votes.iter_mut() {
            voters.retain(|v| v.user_id != voter.user_id);
        }
        self.votes.retain(|(_, voters)| !voters.is_empty());

        match self.votes.iter_mut().find(|(held, _)| *held == label) {
            Some((_, voters)) => voters.push(voter),
            None => self.votes.push((label, vec![voter])),
        }
    }
}

/// Result of a vote registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredVote {
    /// Freshly rendered message body
    pub text: String,
    /// Whether `text` differs from the rendering before this vote
    pub changed: bool,
}

/// Thread-safe store of all live voting sessions
///
/// A single lock guards the whole map so a vote and an expiry sweep never
/// interleave on the same session.
#[derive(Debug, Default)]
pub struct VoteStore {
    sessions: RwLock<HashMap<String, VotingSession>>,
}

impl VoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session with no votes
    ///
    /// An existing session with the same id is replaced.
    pub fn create_session(&self, session_id: impl Into<String>, title: impl Into<String>) {
        self.create_session_at(session_id, title, Utc::now());
    }

    /// Same as [`VoteStore::create_session`] with an explicit creation time
    pub fn create_session_at(
        &self,
        session_id: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) {
        let session_id = session_id.into();
        let session = VotingSession::new(session_id.clone(), title.into(), created_at);

        let replaced = self.sessions.write().insert(session_id.clone(), session);
        if replaced.is_some() {
            tracing::debug!(session_id = %session_id, "Replaced existing voting session");
        }
    }

    /// Record `voter`'s choice in a session and return the new rendering
    pub fn register_vote(
        &self,
        session_id: &str,
        label: ChoiceLabel,
        voter: VoterRecord,
    ) -> AppResult<RegisteredVote> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        let before = render_session_text(session);
        session.apply_vote(label, voter);
        let text = render_session_text(session);

        Ok(RegisteredVote {
            changed: text != before,
            text,
        })
    }

    /// Remove every session older than `retention`, returning how many went
    pub fn expire_older_than(&self, retention: Duration) -> usize {
        self.drain_expired(retention, Utc::now()).len()
    }

    /// Remove and return every session older than `retention` at `now`
    pub fn drain_expired(&self, retention: Duration, now: DateTime<Utc>) -> Vec<VotingSession> {
        let mut sessions = self.sessions.write();

        let expired_ids: Vec<String> = sessions
            .values()
            .filter(|s| s.is_older_than(retention, now))
            .map(|s| s.id.clone())
            .collect();

        expired_ids
            .iter()
            .filter_map(|id| sessions.remove(id))
            .collect()
    }

    /// Snapshot of a session
    pub fn get(&self, session_id: &str) -> Option<VotingSession> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Current rendering of a session
    pub fn render(&self, session_id: &str) -> Option<String> {
        self.sessions.read().get(session_id).map(render_session_text)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
