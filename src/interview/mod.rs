//! Conducting mock interviews.
//!
//! - [`config`]: CLI argument parsing and interview configuration
//! - [`session`]: the live interview driver
//! - [`commands`]: slash command parsing for the REPL

mod commands;
mod config;
mod session;

pub use commands::{InterviewCommand, help_text, parse_command};
pub use config::{
    AppConfig, DEFAULT_LANGUAGE, DEFAULT_MAX_TOKENS, Difficulty, InterviewArgs, InterviewConfig,
    InterviewRole, InterviewType, LANGUAGES,
};
pub use session::{ERROR_PREFIX, Interview, InterviewStats, TurnOutcome};
