use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ContentBlock;

/// The content of a message, which can be either a string or an array of content blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageParamContent {
    /// A simple string content.
    String(String),

    /// An array of content blocks.
    Array(Vec<ContentBlock>),
}

impl MessageParamContent {
    /// Number of image blocks carried by this content.
    pub fn image_count(&self) -> usize {
        match self {
            MessageParamContent::String(_) => 0,
            MessageParamContent::Array(blocks) => blocks.iter().filter(|b| b.is_image()).count(),
        }
    }

    /// Renders the content as plain text, with a placeholder line for each image.
    pub fn to_display_text(&self) -> String {
        match self {
            MessageParamContent::String(s) => s.clone(),
            MessageParamContent::Array(blocks) => {
                let mut parts = Vec::with_capacity(blocks.len());
                for block in blocks {
                    match block {
                        ContentBlock::Text(text) => parts.push(text.text.clone()),
                        ContentBlock::Image(image) => {
                            parts.push(format!("[sketch: {}]", image.source.media_type))
                        }
                        ContentBlock::Unsupported => {}
                    }
                }
                parts.join("\n\n")
            }
        }
    }
}

/// Parameters for a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageParam {
    /// The role of the message.
    pub role: MessageRole,

    /// The content of the message.
    pub content: MessageParamContent,
}

/// Role type for a message parameter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl MessageParam {
    /// Create a new `MessageParam` with the given content and role.
    pub fn new(content: MessageParamContent, role: MessageRole) -> Self {
        Self { role, content }
    }

    /// Create a new `MessageParam` with a string content.
    pub fn new_with_string(content: String, role: MessageRole) -> Self {
        Self::new(MessageParamContent::String(content), role)
    }

    /// Create a new `MessageParam` with an array of content blocks.
    pub fn new_with_blocks(blocks: Vec<ContentBlock>, role: MessageRole) -> Self {
        Self::new(MessageParamContent::Array(blocks), role)
    }

    /// Create a new user `MessageParam` with a string content.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new_with_string(content.into(), MessageRole::User)
    }

    /// Create a new assistant `MessageParam` with a string content.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new_with_string(content.into(), MessageRole::Assistant)
    }
}

impl From<&str> for MessageParam {
    fn from(content: &str) -> Self {
        Self::user(content)
    }
}

impl From<String> for MessageParam {
    fn from(content: String) -> Self {
        Self::user(content)
    }
}

impl<T: AsRef<str>> From<T> for MessageParamContent {
    fn from(content: T) -> Self {
        MessageParamContent::String(content.as_ref().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Base64ImageSource, ImageBlock, ImageMediaType, TextBlock};
    use serde_json::{json, to_value};

    #[test]
    fn message_param_with_string() {
        let message = MessageParam::user("Hello, Claude!".to_string());
        let json = to_value(&message).unwrap();

        assert_eq!(
            json,
            json!({
                "content": "Hello, Claude!",
                "role": "user"
            })
        );
    }

    #[test]
    fn message_param_ergonomic_constructors() {
        let user_msg = MessageParam::user("Hello");
        let assistant_msg = MessageParam::assistant("Hi there");

        assert_eq!(user_msg.role, MessageRole::User);
        assert_eq!(assistant_msg.role, MessageRole::Assistant);

        let message: MessageParam = "Hello from str".into();
        assert_eq!(message.role, MessageRole::User);
    }

    #[test]
    fn message_param_with_mixed_blocks() {
        let blocks = vec![
            ContentBlock::Text(TextBlock::new("Here is my design:")),
            ContentBlock::Image(ImageBlock::new(Base64ImageSource::new(
                "/9j/4AAQ".to_string(),
                ImageMediaType::Jpeg,
            ))),
        ];

        let message = MessageParam::new_with_blocks(blocks, MessageRole::User);
        let json = to_value(&message).unwrap();

        assert_eq!(
            json,
            json!({
                "content": [
                    {
                        "text": "Here is my design:",
                        "type": "text"
                    },
                    {
                        "source": {
                            "data": "/9j/4AAQ",
                            "media_type": "image/jpeg",
                            "type": "base64"
                        },
                        "type": "image"
                    }
                ],
                "role": "user"
            })
        );
        assert_eq!(message.content.image_count(), 1);
        assert_eq!(
            message.content.to_display_text(),
            "Here is my design:\n\n[sketch: image/jpeg]"
        );
    }

    #[test]
    fn message_param_deserialization() {
        let message: MessageParam = serde_json::from_value(json!({
            "content": "Hello, Claude!",
            "role": "user"
        }))
        .unwrap();
        assert_eq!(
            message.content,
            MessageParamContent::String("Hello, Claude!".to_string())
        );

        let message: MessageParam = serde_json::from_value(json!({
            "content": [{"text": "Hello, Claude!", "type": "text"}],
            "role": "assistant"
        }))
        .unwrap();
        match message.content {
            MessageParamContent::Array(blocks) => {
                assert_eq!(blocks.len(), 1);
                assert_eq!(blocks[0].as_text().unwrap().text, "Hello, Claude!");
            }
            _ => panic!("Expected Array variant"),
        }
        assert_eq!(message.role, MessageRole::Assistant);
    }
}
