//! Price estimates and compact number formatting.

use crate::accounting::SessionUsage;
use crate::types::KnownModel;

/// Tokens of context every offered model accepts.
pub const CONTEXT_WINDOW: u64 = 200_000;

/// The model new interviews default to, and whose prices unknown models get.
pub const DEFAULT_MODEL: KnownModel = KnownModel::ClaudeHaiku45;

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub input: f64,
    pub output: f64,
}

impl KnownModel {
    /// List price for this model.
    pub fn price(&self) -> ModelPrice {
        match self {
            KnownModel::ClaudeHaiku45 => ModelPrice {
                input: 1.0,
                output: 5.0,
            },
            KnownModel::ClaudeSonnet45 | KnownModel::ClaudeSonnet40 => ModelPrice {
                input: 3.0,
                output: 15.0,
            },
            KnownModel::ClaudeOpus41 => ModelPrice {
                input: 15.0,
                output: 75.0,
            },
        }
    }
}

/// Price for a model identifier; unknown identifiers are priced as [`DEFAULT_MODEL`].
pub fn price_for(model: &str) -> ModelPrice {
    model
        .parse::<KnownModel>()
        .unwrap_or(DEFAULT_MODEL)
        .price()
}

/// Display name for a model identifier; unknown identifiers display as-is.
pub fn display_name(model: &str) -> String {
    match model.parse::<KnownModel>() {
        Ok(known) => known.display_name().to_string(),
        Err(_) => model.to_string(),
    }
}

/// Estimated cost in USD.
pub fn calculate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    let price = price_for(model);
    (input_tokens as f64 * price.input + output_tokens as f64 * price.output) / 1_000_000.0
}

/// Estimated cost in USD summed over every model in `usage`.
pub fn calculate_total_cost(usage: &SessionUsage) -> f64 {
    usage
        .iter()
        .map(|(model, tokens)| calculate_cost(model, tokens.input_tokens, tokens.output_tokens))
        .sum()
}

/// Format dollars: `$0.00`, `<$0.0001`, four decimals below a cent, else two.
pub fn format_cost(dollars: f64) -> String {
    if dollars == 0.0 {
        "$0.00".to_string()
    } else if dollars < 0.0001 {
        "<$0.0001".to_string()
    } else if dollars < 0.01 {
        format!("${dollars:.4}")
    } else {
        format!("${dollars:.2}")
    }
}

/// Format a token count compactly: `1.2M`, `12k`, `1.2k`, or `999`.
pub fn format_token_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 10_000 {
        format!("{}k", (n as f64 / 1_000.0).round() as u64)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        with_separators(n)
    }
}

/// Format an integer with comma thousands separators.
pub fn with_separators(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Model;

    #[test]
    fn costs() {
        assert_eq!(calculate_cost("claude-haiku-4-5", 1_000_000, 0), 1.0);
        assert_eq!(calculate_cost("claude-haiku-4-5", 0, 1_000_000), 5.0);
        assert_eq!(calculate_cost("claude-opus-4-1", 1_000_000, 1_000_000), 90.0);
        assert_eq!(
            calculate_cost("claude-from-the-future", 1_000_000, 0),
            calculate_cost("claude-haiku-4-5", 1_000_000, 0)
        );
    }

    #[test]
    fn total_cost() {
        let mut usage = SessionUsage::new();
        usage.add(&Model::Known(KnownModel::ClaudeHaiku45), 1_000_000, 0);
        usage.add(&Model::Known(KnownModel::ClaudeSonnet45), 0, 1_000_000);
        assert_eq!(calculate_total_cost(&usage), 16.0);
        assert_eq!(calculate_total_cost(&SessionUsage::new()), 0.0);
    }

    #[test]
    fn cost_formatting() {
        assert_eq!(format_cost(0.0), "$0.00");
        assert_eq!(format_cost(0.00005), "<$0.0001");
        assert_eq!(format_cost(0.0042), "$0.0042");
        assert_eq!(format_cost(0.01), "$0.01");
        assert_eq!(format_cost(12.346), "$12.35");
    }

    #[test]
    fn token_count_formatting() {
        assert_eq!(format_token_count(0), "0");
        assert_eq!(format_token_count(999), "999");
        assert_eq!(format_token_count(1_234), "1.2k");
        assert_eq!(format_token_count(12_500), "13k");
        assert_eq!(format_token_count(199_999), "200k");
        assert_eq!(format_token_count(1_260_000), "1.3M");
        assert_eq!(with_separators(1_234_567), "1,234,567");
        assert_eq!(with_separators(100), "100");
    }

    #[test]
    fn names() {
        assert_eq!(display_name("claude-opus-4-1"), "Claude Opus 4.1");
        assert_eq!(display_name("my-model"), "my-model");
    }
}
