//! UI Builder module for the vote keyboard

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::bot::callbacks::callback_types::VoteCallback;
use crate::vote_store::ChoiceLabel;

/// One row with a button per choice; the same for every session state
pub fn create_vote_keyboard(session_id: &str) -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = ChoiceLabel::KEYBOARD
        .iter()
        .map(|label| {
            InlineKeyboardButton::callback(label.glyph(), VoteCallback::encode(label, session_id))
        })
        .collect();

    InlineKeyboardMarkup::new(vec![row])
}
