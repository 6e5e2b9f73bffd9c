//! Configuration module
//!
//! This module contains the service settings: listen address,
//! GrammarBot credentials, relay error behaviour and logging.

pub mod config;

pub use config::{Config, ErrorMode, GrammarBotConfig, LoggingConfig, RelayConfig, ServerConfig};
