//! # Vote Bot
//!
//! A Telegram inline bot that turns an inline query into a message with four
//! vote buttons and keeps the message updated with who voted for what.
//! Votes live in memory only and are swept after a retention period.

pub mod bot;
pub mod config;
pub mod errors;
pub mod localization;
pub mod observability;
pub mod observability_config;
pub mod rendering;
pub mod session_lifecycle;
pub mod vote_store;

// Re-export types for easier access
pub use rendering::render_session_text;
pub use vote_store::{ChoiceLabel, RegisteredVote, VoteStore, VoterRecord, VotingSession};
