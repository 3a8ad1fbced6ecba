//! Token accounting per model, for one session and across all sessions.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::observability::{USAGE_INPUT_TOKENS, USAGE_OUTPUT_TOKENS};
use crate::storage::{Storage, USAGE_KEY};
use crate::types::{KnownModel, Model};

/// Model that legacy, model-less usage records are attributed to.
pub const LEGACY_MODEL: KnownModel = KnownModel::ClaudeHaiku45;

/// Input and output token totals for one model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelTokens {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl ModelTokens {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Token totals keyed by model identifier.
///
/// Serializes as `{ "<model>": { "inputTokens": .., "outputTokens": .. } }`.
/// Deserialization also accepts the older flat `{ inputTokens, outputTokens }`
/// shape and anything unrecognizable (which reads as empty).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionUsage {
    models: BTreeMap<String, ModelTokens>,
}

impl SessionUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one response's tokens under `model`.
    pub fn add(&mut self, model: &Model, input_tokens: u64, output_tokens: u64) {
        let entry = self.models.entry(model.to_string()).or_default();
        entry.input_tokens = entry.input_tokens.saturating_add(input_tokens);
        entry.output_tokens = entry.output_tokens.saturating_add(output_tokens);
    }

    /// Tokens recorded for `model`.
    pub fn get(&self, model: &str) -> Option<&ModelTokens> {
        self.models.get(model)
    }

    /// Per-model entries in model-identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelTokens)> {
        self.models.iter().map(|(model, tokens)| (model.as_str(), tokens))
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Sum over every model.
    pub fn totals(&self) -> ModelTokens {
        self.models
            .values()
            .fold(ModelTokens::default(), |acc, tokens| ModelTokens {
                input_tokens: acc.input_tokens.saturating_add(tokens.input_tokens),
                output_tokens: acc.output_tokens.saturating_add(tokens.output_tokens),
            })
    }
}

impl<'de> Deserialize<'de> for SessionUsage {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(migrate_usage(&value))
    }
}

/// Read a stored usage value in either the per-model or the legacy flat shape.
pub fn migrate_usage(value: &serde_json::Value) -> SessionUsage {
    let Some(object) = value.as_object() else {
        return SessionUsage::new();
    };
    if object.contains_key("inputTokens") {
        let tokens = serde_json::from_value::<ModelTokens>(value.clone()).unwrap_or_default();
        let mut models = BTreeMap::new();
        models.insert(LEGACY_MODEL.as_str().to_string(), tokens);
        return SessionUsage { models };
    }
    let models = object
        .iter()
        .filter_map(|(model, tokens)| {
            serde_json::from_value::<ModelTokens>(tokens.clone())
                .ok()
                .map(|tokens| (model.clone(), tokens))
        })
        .collect();
    SessionUsage { models }
}

/// Cumulative usage across all sessions, persisted under one storage key.
#[derive(Clone)]
pub struct UsageTracker {
    storage: Arc<dyn Storage>,
}

impl UsageTracker {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The stored cumulative usage.  Missing or unreadable records are empty.
    pub fn all_time(&self) -> SessionUsage {
        match self.storage.get_item(USAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<serde_json::Value>(&raw)
                .map(|value| migrate_usage(&value))
                .unwrap_or_default(),
            Ok(None) | Err(_) => SessionUsage::new(),
        }
    }

    /// Add one response's tokens to the cumulative record and rewrite it.
    pub fn add_usage(
        &self,
        model: &Model,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Result<SessionUsage> {
        USAGE_INPUT_TOKENS.count(input_tokens);
        USAGE_OUTPUT_TOKENS.count(output_tokens);
        let mut usage = self.all_time();
        usage.add(model, input_tokens, output_tokens);
        self.storage
            .set_item(USAGE_KEY, &serde_json::to_string(&usage)?)?;
        Ok(usage)
    }

    /// Forget all cumulative usage.
    pub fn reset(&self) -> Result<()> {
        self.storage.remove_item(USAGE_KEY)
    }
}
