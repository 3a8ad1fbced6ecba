use serde::{Deserialize, Serialize};
use std::fmt;

/// Reasons why the model stopped generating a response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model reached the end of a generated turn
    EndTurn,

    /// The response reached the maximum token limit for the response
    MaxTokens,

    /// The model reached a specified stop sequence
    StopSequence,

    /// The model refused to respond due to safety or other considerations
    Refusal,

    /// Any reason this crate does not act on.
    #[serde(other)]
    Other,
}

impl StopReason {
    /// Returns true when the reply was cut short rather than finished.
    pub fn is_truncated(&self) -> bool {
        matches!(self, StopReason::MaxTokens)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::StopSequence => write!(f, "stop_sequence"),
            StopReason::Refusal => write!(f, "refusal"),
            StopReason::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_reason_round_trip_and_fallback() {
        let reason: StopReason = serde_json::from_str(r#""max_tokens""#).unwrap();
        assert_eq!(reason, StopReason::MaxTokens);
        assert!(reason.is_truncated());

        let reason: StopReason = serde_json::from_str(r#""pause_turn""#).unwrap();
        assert_eq!(reason, StopReason::Other);
        assert!(!reason.is_truncated());
        assert_eq!(StopReason::EndTurn.to_string(), "end_turn");
    }
}
