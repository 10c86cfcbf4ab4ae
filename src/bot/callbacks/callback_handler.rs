//! Callback Handler module for processing vote button presses

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::{ApiError, RequestError};
use tracing::{debug, info, Instrument};

use super::callback_types::{MessageTarget, VoteCallbackEvent};
use super::vote_callbacks::{process_vote, VoteReply};
use crate::bot::ui_builder::create_vote_keyboard;
use crate::errors::{error_logging, AppResult};
use crate::localization::LocalizationManager;
use crate::observability;
use crate::vote_store::VoteStore;

/// Handle callback queries from vote keyboards
///
/// Recoverable errors are logged and the query is left unanswered.
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    store: Arc<VoteStore>,
    localization: Arc<LocalizationManager>,
) -> Result<()> {
    let span = observability::telegram_span("callback_query", Some(q.from.id.0));
    handle_callback(bot, q, store, localization)
        .instrument(span)
        .await
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    store: Arc<VoteStore>,
    localization: Arc<LocalizationManager>,
) -> Result<()> {
    let start_time = std::time::Instant::now();
    observability::record_telegram_update("callback_query");

    let event = VoteCallbackEvent::from_callback_query(&q);
    info!(
        callback_id = %event.callback_id,
        user_id = event.voter.user_id,
        data = ?event.data,
        "Handling callback query"
    );

    let reply = match process_vote(&store, &event) {
        Ok(reply) => reply,
        Err(e) => {
            error_logging::log_dropped_update(
                &e,
                "callback_query",
                Some(event.voter.user_id),
                Some(&event.callback_id),
            );
            return Ok(());
        }
    };

    if reply.needs_edit {
        if let Err(e) = edit_vote_message(&bot, &reply).await {
            error_logging::log_network_error(&e, "edit_vote_message", Some(event.voter.user_id));
        }
    } else {
        debug!(session_id = %reply.session_id, "Message content is the same, no need to update");
    }

    let confirmation = localization.t("vote-counted", event.language_code.as_deref());
    bot.answer_callback_query(q.id.clone())
        .text(confirmation)
        .show_alert(false)
        .await?;

    observability::record_request_metrics("telegram_callback", 200, start_time.elapsed());
    Ok(())
}

/// Replace the message text and re-attach the keyboard
///
/// Telegram refusing an edit because the text is already current is not
/// an error.
async fn edit_vote_message(bot: &Bot, reply: &VoteReply) -> AppResult<()> {
    let keyboard = create_vote_keyboard(&reply.session_id);

    let result = match &reply.target {
        MessageTarget::Inline(inline_message_id) => bot
            .edit_message_text_inline(inline_message_id.clone(), reply.text.clone())
            .reply_markup(keyboard)
            .await
            .map(|_| ()),
        MessageTarget::Chat {
            chat_id,
            message_id,
        } => bot
            .edit_message_text(*chat_id, *message_id, reply.text.clone())
            .reply_markup(keyboard)
            .await
            .map(|_| ()),
    };

    match result {
        Err(RequestError::Api(ApiError::MessageNotModified)) => {
            debug!(session_id = %reply.session_id, "Message already shows the current votes");
            Ok(())
        }
        other => Ok(other?),
    }
}
