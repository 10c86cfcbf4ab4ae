//! Inline query handling: every non-blank query opens a new voting session

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{
    InlineQuery, InlineQueryResult, InlineQueryResultArticle, InputMessageContent,
    InputMessageContentText,
};
use tracing::{info, Instrument};

use crate::bot::ui_builder::create_vote_keyboard;
use crate::errors::{error_logging, AppError, AppResult};
use crate::localization::LocalizationManager;
use crate::observability;
use crate::vote_store::VoteStore;

/// The single result offered for an inline query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAnswer {
    /// Session id, also used as the result id
    pub session_id: String,
    /// Result title shown in the inline popup
    pub title: String,
    /// Body of the message that gets posted
    pub message_text: String,
}

/// Create the session for an inline query and describe the answer
pub fn prepare_inline_answer(
    store: &VoteStore,
    localization: &LocalizationManager,
    query_id: &str,
    query_text: &str,
    language_code: Option<&str>,
) -> AppResult<InlineAnswer> {
    if query_text.trim().is_empty() {
        return Err(AppError::BlankQuery);
    }

    store.create_session(query_id, query_text);
    observability::record_session_created(store.len());

    Ok(InlineAnswer {
        session_id: query_id.to_string(),
        title: localization.t_args("create-vote-title", &[("query", query_text)], language_code),
        message_text: query_text.to_string(),
    })
}

/// Answer an inline query with a personal vote article
pub async fn inline_query_handler(
    bot: Bot,
    q: InlineQuery,
    store: Arc<VoteStore>,
    localization: Arc<LocalizationManager>,
) -> Result<()> {
    let span = observability::telegram_span("inline_query", Some(q.from.id.0));
    handle_inline_query(bot, q, store, localization)
        .instrument(span)
        .await
}

async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    store: Arc<VoteStore>,
    localization: Arc<LocalizationManager>,
) -> Result<()> {
    let start_time = std::time::Instant::now();
    observability::record_telegram_update("inline_query");

    let query_id = q.id.to_string();
    let answer = match prepare_inline_answer(
        &store,
        &localization,
        &query_id,
        &q.query,
        q.from.language_code.as_deref(),
    ) {
        Ok(answer) => answer,
        Err(e) => {
            error_logging::log_dropped_update(&e, "inline_query", Some(q.from.id.0), Some(&query_id));
            return Ok(());
        }
    };

    info!(session_id = %answer.session_id, query = %answer.message_text, "Handling inline query");

    let article = InlineQueryResultArticle::new(
        answer.session_id.clone(),
        answer.title,
        InputMessageContent::Text(InputMessageContentText::new(answer.message_text)),
    )
    .reply_markup(create_vote_keyboard(&answer.session_id));

    bot.answer_inline_query(q.id.clone(), vec![InlineQueryResult::Article(article)])
        .is_personal(true)
        .await?;

    observability::record_request_metrics("telegram_inline_query", 200, start_time.elapsed());
    Ok(())
}
