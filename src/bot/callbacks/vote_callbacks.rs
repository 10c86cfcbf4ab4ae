//! Vote button handling, independent of the Telegram client

use crate::errors::{AppError, AppResult};
use crate::vote_store::VoteStore;

use super::callback_types::{MessageTarget, VoteCallback, VoteCallbackEvent};

/// What to send back after a vote was registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteReply {
    pub session_id: String,
    pub target: MessageTarget,
    pub text: String,
    /// False when the message already shows `text`
    pub needs_edit: bool,
}

/// Whether the target message has to be edited to show `text`
///
/// Inline messages are always edited since their current text is unknown.
/// Telegram strips trailing whitespace from message text, so chat messages
/// are compared without it.
pub fn needs_edit(target: &MessageTarget, displayed_text: Option<&str>, text: &str) -> bool {
    match (target, displayed_text) {
        (MessageTarget::Chat { .. }, Some(shown)) => shown.trim_end() != text.trim_end(),
        _ => true,
    }
}

/// Validate a button press and register the vote
///
/// Nothing is mutated unless the payload parses and the event carries a
/// message to edit.
pub fn process_vote(store: &VoteStore, event: &VoteCallbackEvent) -> AppResult<VoteReply> {
    let callback = VoteCallback::parse(event.data.as_deref().unwrap_or_default())?;

    let target = event.target.clone().ok_or_else(|| {
        AppError::MissingTargetMessage(format!(
            "Callback {} has neither an inline message id nor a message",
            event.callback_id
        ))
    })?;

    let span = crate::observability::store_span("register_vote", &callback.session_id);
    let _enter = span.enter();

    let vote = store.register_vote(&callback.session_id, callback.label.clone(), event.voter.clone())?;

    tracing::info!(
        label = %callback.label,
        user_id = event.voter.user_id,
        changed = vote.changed,
        "Registered vote"
    );
    crate::observability::record_vote_metrics(&callback.label, vote.changed);

    let needs_edit = needs_edit(&target, event.displayed_text.as_deref(), &vote.text);

    Ok(VoteReply {
        session_id: callback.session_id,
        target,
        text: vote.text,
        needs_edit,
    })
}
