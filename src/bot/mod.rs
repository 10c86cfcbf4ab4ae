//! Bot module for handling Telegram interactions
//!
//! - `inline_query_handler`: Opens a voting session per inline query
//! - `callbacks`: Vote button presses
//! - `ui_builder`: The fixed vote keyboard

pub mod callbacks;
pub mod inline_query_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callbacks::callback_handler::callback_handler;
pub use inline_query_handler::inline_query_handler;
pub use ui_builder::create_vote_keyboard;
