//! Persisted interview sessions.
//!
//! All sessions live in one JSON array under [`SESSIONS_KEY`]; every mutation
//! reads the array, edits it, and writes it back in full.  Records that fail
//! to parse are skipped when listing and written back untouched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::accounting::SessionUsage;
use crate::error::Result;
use crate::interview::{InterviewConfig, InterviewType};
use crate::observability::{SESSION_READ_FAILURES, SESSION_SAVES, SESSION_SAVE_FAILURES};
use crate::prompts::build_system_prompt;
use crate::storage::{SESSIONS_KEY, Storage};
use crate::types::MessageParam;

/// One persisted interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub config: InterviewConfig,
    pub system_prompt: String,
    #[serde(default)]
    pub messages: Vec<MessageParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<SessionUsage>,
}

impl InterviewSession {
    /// A fresh session with a new id, the current time, and the system prompt
    /// built from `config`.
    pub fn new(config: InterviewConfig) -> Self {
        let system_prompt = build_system_prompt(&config);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: OffsetDateTime::now_utc(),
            config,
            system_prompt,
            messages: Vec::new(),
            usage: None,
        }
    }

    /// Sets the creation time.
    pub fn with_created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = created_at;
        self
    }

    /// The first eight characters of the id, for tables.
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    /// The stored usage, or empty when none was recorded.
    pub fn usage(&self) -> SessionUsage {
        self.usage.clone().unwrap_or_default()
    }
}

/// Reads and writes [`InterviewSession`]s.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Every session, newest first.  Missing or corrupt storage reads as empty.
    pub fn list(&self) -> Vec<InterviewSession> {
        let mut sessions: Vec<InterviewSession> = self
            .records()
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(session) => Some(session),
                Err(_) => {
                    SESSION_READ_FAILURES.click();
                    None
                }
            })
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions
    }

    /// The session with `id`.
    pub fn get(&self, id: &str) -> Option<InterviewSession> {
        self.list().into_iter().find(|s| s.id == id)
    }

    /// Replace the session with the same id, or insert it first.
    pub fn save(&self, session: &InterviewSession) -> Result<()> {
        let mut records = self.records();
        let record = serde_json::to_value(session)?;
        match records.iter_mut().find(|r| record_id(r) == Some(session.id.as_str())) {
            Some(existing) => *existing = record,
            None => records.insert(0, record),
        }
        let result = self.write(&records);
        match result {
            Ok(()) => SESSION_SAVES.click(),
            Err(_) => SESSION_SAVE_FAILURES.click(),
        }
        result
    }

    /// Remove the session with `id`.  Failures are ignored.
    pub fn delete(&self, id: &str) {
        let mut records = self.records();
        records.retain(|r| record_id(r) != Some(id));
        if self.write(&records).is_err() {
            SESSION_SAVE_FAILURES.click();
        }
    }

    /// Sessions whose id starts with `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<InterviewSession> {
        self.list()
            .into_iter()
            .filter(|s| s.id.starts_with(prefix))
            .collect()
    }

    /// The stored array, one JSON value per session.
    fn records(&self) -> Vec<Value> {
        let raw = match self.storage.get_item(SESSIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(_) => {
                SESSION_READ_FAILURES.click();
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(records) => records,
            Err(_) => {
                SESSION_READ_FAILURES.click();
                Vec::new()
            }
        }
    }

    fn write(&self, records: &[Value]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.storage.set_item(SESSIONS_KEY, &raw)
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Keep sessions of `type_filter` (or every type) whose topic, type, or
/// difficulty contains `text`, ignoring case.
pub fn filter(
    sessions: &[InterviewSession],
    type_filter: Option<InterviewType>,
    text: &str,
) -> Vec<InterviewSession> {
    let query = text.trim().to_lowercase();
    sessions
        .iter()
        .filter(|s| type_filter.is_none_or(|t| s.config.interview_type == t))
        .filter(|s| {
            query.is_empty()
                || s.config.topic.to_lowercase().contains(&query)
                || s.config.interview_type.as_str().contains(&query)
                || s.config.difficulty.as_str().contains(&query)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::Difficulty;
    use crate::storage::MemoryStorage;
    use crate::types::{ContentBlock, KnownModel, MessageRole, Model};
    use time::macros::datetime;

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        (storage.clone(), SessionStore::new(storage))
    }

    #[test]
    fn new_session_has_prompt_and_id() {
        let session = InterviewSession::new(InterviewConfig::new().with_topic("rate limiter"));
        assert_eq!(session.id.len(), 36);
        assert!(session.system_prompt.contains("Topic: rate limiter"));
        assert!(session.messages.is_empty());
        assert!(session.usage.is_none());
        assert_eq!(session.short_id().len(), 8);
    }

    #[test]
    fn save_get_delete() {
        let (_, store) = store();
        let mut session = InterviewSession::new(InterviewConfig::new());
        store.save(&session).unwrap();
        assert_eq!(store.get(&session.id), Some(session.clone()));

        session.messages.push(MessageParam::user("hello"));
        store.save(&session).unwrap();
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get(&session.id).unwrap().messages.len(), 1);

        store.delete(&session.id);
        assert!(store.get(&session.id).is_none());
        store.delete("missing");
    }

    #[test]
    fn list_is_newest_first() {
        let (_, store) = store();
        let old = InterviewSession::new(InterviewConfig::new())
            .with_created_at(datetime!(2024-01-01 00:00 UTC));
        let new = InterviewSession::new(InterviewConfig::new())
            .with_created_at(datetime!(2025-06-01 12:00 UTC));
        let middle = InterviewSession::new(InterviewConfig::new())
            .with_created_at(datetime!(2024-08-15 09:30 UTC));
        store.save(&old).unwrap();
        store.save(&new).unwrap();
        store.save(&middle).unwrap();
        let ids: Vec<String> = store.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![new.id, middle.id, old.id]);
    }

    #[test]
    fn corrupt_storage_reads_empty() {
        let (storage, store) = store();
        storage.set_item(SESSIONS_KEY, "[{\"id\": 3").unwrap();
        assert!(store.list().is_empty());
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn one_bad_record_does_not_hide_the_rest() {
        let (storage, store) = store();
        let current = InterviewSession::new(InterviewConfig::new().with_topic("queues"))
            .with_created_at(datetime!(2025-02-01 00:00 UTC));
        let mut legacy = serde_json::to_value(
            InterviewSession::new(InterviewConfig::new())
                .with_created_at(datetime!(2024-02-01 00:00 UTC)),
        )
        .unwrap();
        legacy["id"] = "legacy".into();
        legacy["config"].as_object_mut().unwrap().remove("model");
        let broken = serde_json::json!({"id": "broken", "config": {"type": "pairing"}});
        let raw = serde_json::json!([serde_json::to_value(&current).unwrap(), legacy, broken]);
        storage.set_item(SESSIONS_KEY, &raw.to_string()).unwrap();

        let listed = store.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, current.id);
        assert_eq!(
            listed[1].config.model,
            Model::Known(KnownModel::ClaudeHaiku45)
        );

        // Saving another session keeps every stored record, even the broken one.
        let added = InterviewSession::new(InterviewConfig::new());
        store.save(&added).unwrap();
        let stored: Vec<Value> =
            serde_json::from_str(&storage.get_item(SESSIONS_KEY).unwrap().unwrap()).unwrap();
        let ids: Vec<&str> = stored.iter().filter_map(record_id).collect();
        assert_eq!(ids, vec![added.id.as_str(), current.id.as_str(), "legacy", "broken"]);
        assert_eq!(store.list().len(), 3);

        store.delete("legacy");
        assert!(store.get("legacy").is_none());
        assert!(store.get(&current.id).is_some());
    }

    #[test]
    fn save_failure_is_reported() {
        let (storage, store) = store();
        storage.fail_writes(true);
        let session = InterviewSession::new(InterviewConfig::new());
        assert!(store.save(&session).unwrap_err().is_storage());
        store.delete(&session.id);
    }

    #[test]
    fn wire_shape() {
        let mut session = InterviewSession::new(InterviewConfig::new())
            .with_created_at(datetime!(2025-03-04 05:06:07 UTC));
        session.id = "abc".to_string();
        session.messages.push(MessageParam::new_with_blocks(
            vec![ContentBlock::text("hi")],
            MessageRole::User,
        ));
        session.messages.push(MessageParam::assistant("hello"));
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["createdAt"], "2025-03-04T05:06:07Z");
        assert_eq!(value["config"]["type"], "systems-design");
        assert!(value["systemPrompt"].as_str().unwrap().starts_with("You are"));
        assert_eq!(
            value["messages"],
            serde_json::json!([
                {"role": "user", "content": [{"type": "text", "text": "hi"}]},
                {"role": "assistant", "content": "hello"},
            ])
        );
        assert!(value.get("usage").is_none());
    }

    #[test]
    fn legacy_usage_is_migrated_on_read() {
        let (storage, store) = store();
        let raw = serde_json::json!([{
            "id": "legacy",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "config": {
                "type": "behavioral",
                "role": "interviewee",
                "difficulty": "staff",
                "topic": "",
                "model": "claude-haiku-4-5"
            },
            "systemPrompt": "prompt",
            "messages": [],
            "usage": {"inputTokens": 12, "outputTokens": 34}
        }]);
        storage.set_item(SESSIONS_KEY, &raw.to_string()).unwrap();
        let session = store.get("legacy").unwrap();
        assert_eq!(session.config.difficulty, Difficulty::Staff);
        assert_eq!(session.config.model, Model::Known(KnownModel::ClaudeHaiku45));
        let usage = session.usage();
        assert_eq!(usage.get("claude-haiku-4-5").unwrap().input_tokens, 12);
        assert_eq!(usage.get("claude-haiku-4-5").unwrap().output_tokens, 34);
    }

    #[test]
    fn filtering() {
        let sessions = vec![
            InterviewSession::new(InterviewConfig::new().with_topic("Chat System")),
            InterviewSession::new(
                InterviewConfig::new()
                    .with_type(InterviewType::Coding)
                    .with_difficulty(Difficulty::Senior),
            ),
            InterviewSession::new(InterviewConfig::new().with_type(InterviewType::Behavioral)),
        ];
        assert_eq!(filter(&sessions, None, "").len(), 3);
        assert_eq!(filter(&sessions, Some(InterviewType::Coding), "").len(), 1);
        assert_eq!(filter(&sessions, None, "chat").len(), 1);
        assert_eq!(filter(&sessions, None, "SENIOR").len(), 1);
        assert_eq!(filter(&sessions, None, "mid").len(), 2);
        assert_eq!(filter(&sessions, Some(InterviewType::Behavioral), "chat").len(), 0);
    }
}
