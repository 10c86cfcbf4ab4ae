//! Shared types for callback handlers
//!
//! Callback data is parsed into typed values here, before any handler
//! touches the vote store.

use teloxide::types::{CallbackQuery, ChatId, MessageId};

use crate::errors::{AppError, AppResult};
use crate::vote_store::{ChoiceLabel, VoterRecord};

/// Separator between the label and the session id in callback data
pub const PAYLOAD_SEPARATOR: char = '|';

/// Parsed `<label>|<session_id>` callback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCallback {
    pub label: ChoiceLabel,
    pub session_id: String,
}

impl VoteCallback {
    /// Parse callback data from a vote button
    pub fn parse(data: &str) -> AppResult<Self> {
        let malformed = || AppError::MalformedPayload(data.to_string());

        let (label, session_id) = data.split_once(PAYLOAD_SEPARATOR).ok_or_else(malformed)?;
        if label.is_empty() || session_id.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            label: ChoiceLabel::from(label),
            session_id: session_id.to_string(),
        })
    }

    /// Callback data for a button
    pub fn encode(label: &ChoiceLabel, session_id: &str) -> String {
        format!("{}{}{}", label.as_str(), PAYLOAD_SEPARATOR, session_id)
    }
}

/// The message a callback came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    /// Message sent through inline mode
    Inline(String),
    /// Regular chat message
    Chat { chat_id: ChatId, message_id: MessageId },
}

/// Transport-independent view of a vote button press
#[derive(Debug, Clone)]
pub struct VoteCallbackEvent {
    pub callback_id: String,
    pub voter: VoterRecord,
    pub data: Option<String>,
    pub target: Option<MessageTarget>,
    /// Text of the chat message as Telegram currently shows it. Inline
    /// messages are never delivered with the callback.
    pub displayed_text: Option<String>,
    pub language_code: Option<String>,
}

impl VoteCallbackEvent {
    pub fn from_callback_query(q: &CallbackQuery) -> Self {
        let target = match (&q.inline_message_id, &q.message) {
            (Some(inline_id), _) => Some(MessageTarget::Inline(inline_id.clone())),
            (None, Some(msg)) => Some(MessageTarget::Chat {
                chat_id: msg.chat().id,
                message_id: msg.id(),
            }),
            (None, None) => None,
        };

        Self {
            callback_id: q.id.to_string(),
            voter: VoterRecord::from_name_parts(
                q.from.id.0,
                q.from.username.as_deref(),
                &q.from.first_name,
                q.from.last_name.as_deref(),
            ),
            data: q.data.clone(),
            target,
            displayed_text: q
                .regular_message()
                .and_then(|msg| msg.text())
                .map(str::to_string),
            language_code: q.from.language_code.clone(),
        }
    }
}
