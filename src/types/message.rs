use serde::{Deserialize, Serialize};

use crate::types::{ContentBlock, MessageRole, Model, StopReason, Usage};

/// Placeholder used when a reply does not open with a text block.
pub const NON_TEXT_REPLY: &str = "N/A";

/// An assistant message returned by the Messages API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique object identifier.
    pub id: String,

    /// Content generated by the model.
    pub content: Vec<ContentBlock>,

    /// The model that handled the request.
    pub model: Model,

    /// Conversational role of the generated message; always "assistant".
    pub role: MessageRole,

    /// The reason that generation stopped.
    #[serde(default)]
    pub stop_reason: Option<StopReason>,

    /// Which custom stop sequence was generated, if any.
    #[serde(default)]
    pub stop_sequence: Option<String>,

    /// Billing and rate-limit usage.
    pub usage: Usage,
}

impl Message {
    /// Create a new assistant `Message`.
    pub fn new(id: String, content: Vec<ContentBlock>, model: Model, usage: Usage) -> Self {
        Self {
            id,
            content,
            model,
            role: MessageRole::Assistant,
            stop_reason: None,
            stop_sequence: None,
            usage,
        }
    }

    /// Set the stop reason.
    pub fn with_stop_reason(mut self, stop_reason: StopReason) -> Self {
        self.stop_reason = Some(stop_reason);
        self
    }

    /// The reply text shown in the transcript.
    ///
    /// Only the first content block is considered: its text when it is a text
    /// block, [`NON_TEXT_REPLY`] otherwise.
    pub fn reply_text(&self) -> String {
        match self.content.first() {
            Some(ContentBlock::Text(text)) => text.text.clone(),
            _ => NON_TEXT_REPLY.to_string(),
        }
    }
}
