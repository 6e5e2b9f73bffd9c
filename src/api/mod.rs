//! External API client and models
//!
//! This module handles communication with the grammar-checking
//! service. Results are kept as raw JSON because their shape is
//! owned by the provider.

pub mod grammarbot;

pub use grammarbot::{match_count, GrammarBotClient, GrammarChecker};
