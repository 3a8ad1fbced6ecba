use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents an Anthropic model identifier.
///
/// This can be a predefined model alias or a custom string value
/// for models that may be added in the future.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model aliases
    Known(KnownModel),

    /// Custom model identifier (for future models or private models)
    Custom(String),
}

/// Known Anthropic model aliases offered for interviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Claude Haiku 4.5
    #[serde(rename = "claude-haiku-4-5")]
    ClaudeHaiku45,

    /// Claude Sonnet 4.5
    #[serde(rename = "claude-sonnet-4-5")]
    ClaudeSonnet45,

    /// Claude Sonnet 4
    #[serde(rename = "claude-sonnet-4-0")]
    ClaudeSonnet40,

    /// Claude Opus 4.1
    #[serde(rename = "claude-opus-4-1")]
    ClaudeOpus41,
}

impl KnownModel {
    /// Every known model, in the order they are offered.
    pub const ALL: [KnownModel; 4] = [
        KnownModel::ClaudeHaiku45,
        KnownModel::ClaudeSonnet45,
        KnownModel::ClaudeSonnet40,
        KnownModel::ClaudeOpus41,
    ];

    /// The API identifier for this model.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::ClaudeHaiku45 => "claude-haiku-4-5",
            KnownModel::ClaudeSonnet45 => "claude-sonnet-4-5",
            KnownModel::ClaudeSonnet40 => "claude-sonnet-4-0",
            KnownModel::ClaudeOpus41 => "claude-opus-4-1",
        }
    }

    /// Human readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            KnownModel::ClaudeHaiku45 => "Claude Haiku 4.5",
            KnownModel::ClaudeSonnet45 => "Claude Sonnet 4.5",
            KnownModel::ClaudeSonnet40 => "Claude Sonnet 4",
            KnownModel::ClaudeOpus41 => "Claude Opus 4.1",
        }
    }
}

impl Model {
    /// Human readable name; custom models display their identifier.
    pub fn display_name(&self) -> String {
        match self {
            Model::Known(known) => known.display_name().to_string(),
            Model::Custom(custom) => custom.clone(),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{}", known_model),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnownModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnownModel::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown model: {s}"))
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Model::from(s))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        match model.parse::<KnownModel>() {
            Ok(known) => Model::Known(known),
            Err(_) => Model::Custom(model),
        }
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::from(model.to_string())
    }
}
