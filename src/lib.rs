//! persona-bot: a Discord bot that answers mentions in character using an
//! OpenAI-compatible completion endpoint.
//!
//! Each mention gets a placeholder reply that is edited once: with the
//! completion, with a timeout notice, or with a failure notice.

pub mod comms;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod llm;
pub mod logger;
pub mod mention;
pub mod prompt;
pub mod race;
pub mod responder;
pub mod runtime;
pub mod throbber;
