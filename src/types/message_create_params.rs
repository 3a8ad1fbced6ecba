use serde::{Deserialize, Serialize};

use crate::types::{MessageParam, Model};

/// Body of a `POST /v1/messages` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageCreateParams {
    /// The model that will complete the prompt.
    pub model: Model,

    /// The maximum number of tokens to generate before stopping.
    pub max_tokens: u32,

    /// Input messages, oldest first.
    pub messages: Vec<MessageParam>,

    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl MessageCreateParams {
    /// Create request parameters without a system prompt.
    pub fn new(max_tokens: u32, messages: Vec<MessageParam>, model: Model) -> Self {
        Self {
            model,
            max_tokens,
            messages,
            system: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}
