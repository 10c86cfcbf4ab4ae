//! Callbacks module for handling inline keyboard callback queries
//!
//! - `callback_handler`: Telegram entry point for callback queries
//! - `callback_types`: Typed callback payloads and events
//! - `vote_callbacks`: Vote registration for button presses

pub mod callback_handler;
pub mod callback_types;
pub mod vote_callbacks;
