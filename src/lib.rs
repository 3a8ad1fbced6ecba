//! mimid: mock-interview practice over the Anthropic Messages API.
//!
//! The library holds everything but the terminal front end: session and usage
//! persistence, prompt construction, the chat-completion client, and the
//! [`Interview`] driver that ties them together.

// Public modules
pub mod accounting;
pub mod api_key;
pub mod client;
pub mod client_logger;
pub mod composer;
pub mod error;
pub mod interview;
pub mod pricing;
pub mod prompts;
pub mod render;
pub mod sessions;
pub mod storage;
pub mod types;

mod observability;

// Re-exports
pub use accounting::{ModelTokens, SessionUsage, UsageTracker, migrate_usage};
pub use api_key::ApiKeyStore;
pub use client::{Anthropic, MessageSender};
pub use client_logger::{ClientLogger, JsonlLogger};
pub use composer::{ComposedTurn, Composer, ComposerPart};
pub use error::{Error, FailureKind, Result};
pub use interview::{Interview, InterviewConfig, TurnOutcome};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use sessions::{InterviewSession, SessionStore};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use types::*;
