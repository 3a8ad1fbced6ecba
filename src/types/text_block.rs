use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A block of text content in a message.
///
/// User turns carry markdown here: prose, lists, and code fenced as
/// ```` ```lang ... ``` ````.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextBlock {
    /// The text content.
    pub text: String,
}

impl TextBlock {
    /// Creates a new TextBlock with the specified text.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }

    /// Returns true if the text is empty once surrounding whitespace is removed.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl FromStr for TextBlock {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for TextBlock {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TextBlock {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
