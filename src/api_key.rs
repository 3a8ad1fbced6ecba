//! The stored Anthropic API key.

use std::env;
use std::sync::Arc;

use crate::client::API_KEY_ENV;
use crate::error::{Error, Result};
use crate::storage::{API_KEY_KEY, Storage};

/// Every Anthropic API key starts with this.
pub const KEY_PREFIX: &str = "sk-ant-";

/// Reads and writes the API key.
#[derive(Clone)]
pub struct ApiKeyStore {
    storage: Arc<dyn Storage>,
}

impl ApiKeyStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The stored key, if any.
    pub fn get(&self) -> Option<String> {
        self.storage
            .get_item(API_KEY_KEY)
            .ok()
            .flatten()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// The key to authenticate with: `$MIMID_API_KEY` when set, otherwise the
    /// stored key.
    pub fn resolve(&self) -> Option<String> {
        env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .or_else(|| self.get())
    }

    /// Store `key`, which must start with `sk-ant-`.
    pub fn save(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if !key.starts_with(KEY_PREFIX) {
            return Err(Error::validation(
                "Key must start with sk-ant-. Check that you copied the full key.",
                Some("api_key".to_string()),
            ));
        }
        self.storage.set_item(API_KEY_KEY, key)
    }

    /// Forget the stored key.
    pub fn delete(&self) -> Result<()> {
        self.storage.remove_item(API_KEY_KEY)
    }

    /// The stored key with all but its last four characters hidden.
    pub fn masked(&self) -> Option<String> {
        self.get().map(|key| mask(&key))
    }
}

/// `sk-ant-...` followed by the last four characters of `key`.
pub fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{KEY_PREFIX}...{tail}")
}
