//! Live interview management.
//!
//! This module provides the [`Interview`] struct, which owns one session's
//! transcript while it is being conducted and drives each turn against the
//! chat-completion API.

use std::sync::Arc;

use crate::accounting::{SessionUsage, UsageTracker};
use crate::client::MessageSender;
use crate::error::{Error, FailureKind, Result};
use crate::interview::config::InterviewConfig;
use crate::observability::{INTERVIEW_AUTH_FAILURES, INTERVIEW_INLINE_ERRORS, INTERVIEW_TURNS};
use crate::prompts::build_first_message;
use crate::sessions::{InterviewSession, SessionStore};
use crate::types::{ContentBlock, MessageCreateParams, MessageParam, MessageRole, Usage};

/// Leads the assistant message that records a failed turn.
pub const ERROR_PREFIX: &str = "**Error:** ";

/// What happened to a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Nothing was sent.
    Skipped,
    /// The assistant replied.
    Replied {
        text: String,
        usage: Usage,
        truncated: bool,
    },
    /// The API key was rejected; the banner state is set.
    AuthenticationFailed(String),
    /// Any other failure; an assistant error message was appended.
    Failed(String),
}

/// Aggregated stats for an interview.
#[derive(Debug, Clone)]
pub struct InterviewStats {
    /// Messages in the persisted history.
    pub message_count: usize,
    /// Per-model tokens recorded for this session.
    pub usage: SessionUsage,
}

/// A session being conducted.
pub struct Interview {
    sender: Arc<dyn MessageSender>,
    sessions: SessionStore,
    usage: UsageTracker,
    session: InterviewSession,
    max_tokens: u32,
    init_called: bool,
    api_error: Option<String>,
    save_error: bool,
}

impl Interview {
    /// Create and persist a new session from `config`.
    ///
    /// A failed save sets the save-error flag rather than failing.
    pub fn create(
        config: InterviewConfig,
        sender: Arc<dyn MessageSender>,
        sessions: SessionStore,
        usage: UsageTracker,
        max_tokens: u32,
    ) -> Self {
        let session = InterviewSession::new(config);
        let save_error = sessions.save(&session).is_err();
        let mut interview = Self::from_session(session, sender, sessions, usage, max_tokens);
        interview.save_error = save_error;
        interview
    }

    /// Load the stored session `id`.
    pub fn open(
        id: &str,
        sender: Arc<dyn MessageSender>,
        sessions: SessionStore,
        usage: UsageTracker,
        max_tokens: u32,
    ) -> Result<Self> {
        let session = sessions.get(id).ok_or_else(|| {
            Error::not_found(
                format!("no interview session with id {id}"),
                Some("session".to_string()),
                Some(id.to_string()),
            )
        })?;
        Ok(Self::from_session(session, sender, sessions, usage, max_tokens))
    }

    fn from_session(
        mut session: InterviewSession,
        sender: Arc<dyn MessageSender>,
        sessions: SessionStore,
        usage: UsageTracker,
        max_tokens: u32,
    ) -> Self {
        session.usage = Some(session.usage());
        Self {
            sender,
            sessions,
            usage,
            session,
            max_tokens,
            init_called: false,
            api_error: None,
            save_error: false,
        }
    }

    /// Ask the assistant to open the interview.
    ///
    /// Runs at most once per `Interview`, and only when the session has no
    /// messages.  The opening request is sent but never stored.
    pub async fn init_interview(&mut self) -> TurnOutcome {
        if self.init_called {
            return TurnOutcome::Skipped;
        }
        self.init_called = true;
        if !self.session.messages.is_empty() {
            return TurnOutcome::Skipped;
        }
        let trigger = MessageParam::user(build_first_message(&self.session.config));
        self.call_model(vec![trigger]).await
    }

    /// Send one user turn.  An empty block list is ignored.
    pub async fn send_message(&mut self, blocks: Vec<ContentBlock>) -> TurnOutcome {
        if blocks.is_empty() {
            return TurnOutcome::Skipped;
        }
        let message = MessageParam::new_with_blocks(blocks, MessageRole::User);
        self.session.messages.push(message);
        self.save();
        let history = self.session.messages.clone();
        self.call_model(history).await
    }

    async fn call_model(&mut self, history: Vec<MessageParam>) -> TurnOutcome {
        INTERVIEW_TURNS.click();
        self.api_error = None;
        let model = self.session.config.model.clone();
        let params = MessageCreateParams::new(self.max_tokens, history, model.clone())
            .with_system(self.session.system_prompt.clone());

        match self.sender.send(params).await {
            Ok(response) => {
                let usage = response.usage;
                if self
                    .usage
                    .add_usage(&model, usage.input_tokens, usage.output_tokens)
                    .is_err()
                {
                    self.save_error = true;
                }
                let mut session_usage = self.session.usage();
                session_usage.add(&model, usage.input_tokens, usage.output_tokens);
                self.session.usage = Some(session_usage);

                let text = response.reply_text();
                self.session
                    .messages
                    .push(MessageParam::assistant(text.clone()));
                self.save();
                TurnOutcome::Replied {
                    text,
                    usage,
                    truncated: response.stop_reason.is_some_and(|r| r.is_truncated()),
                }
            }
            Err(err) => {
                let message = err.to_string();
                match err.failure_kind() {
                    FailureKind::Authentication => {
                        INTERVIEW_AUTH_FAILURES.click();
                        self.api_error = Some(message.clone());
                        TurnOutcome::AuthenticationFailed(message)
                    }
                    FailureKind::Other => {
                        // Kept in the history so user and assistant turns
                        // still alternate on the next request.
                        INTERVIEW_INLINE_ERRORS.click();
                        self.session
                            .messages
                            .push(MessageParam::assistant(format!("{ERROR_PREFIX}{message}")));
                        self.save();
                        TurnOutcome::Failed(message)
                    }
                }
            }
        }
    }

    fn save(&mut self) {
        if self.sessions.save(&self.session).is_err() {
            self.save_error = true;
        }
    }

    /// The persisted session as it currently stands.
    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    /// The conversation so far, including recorded errors.
    pub fn transcript(&self) -> &[MessageParam] {
        &self.session.messages
    }

    /// Tokens recorded for this session, per model.
    pub fn session_usage(&self) -> SessionUsage {
        self.session.usage()
    }

    /// The authentication failure currently shown as a banner, if any.
    pub fn api_error(&self) -> Option<&str> {
        self.api_error.as_deref()
    }

    /// Hide the authentication banner.
    pub fn clear_api_error(&mut self) {
        self.api_error = None;
    }

    /// Whether a save failed since the warning was last dismissed.
    pub fn save_error(&self) -> bool {
        self.save_error
    }

    /// Hide the save-failure warning.
    pub fn dismiss_save_error(&mut self) {
        self.save_error = false;
    }

    /// Label for the assistant's side of the conversation.
    pub fn assistant_label(&self) -> &'static str {
        self.session.config.role.assistant_label()
    }

    /// Returns aggregated statistics for the interview.
    pub fn stats(&self) -> InterviewStats {
        InterviewStats {
            message_count: self.session.messages.len(),
            usage: self.session.usage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::storage::{MemoryStorage, Storage};
    use crate::types::{KnownModel, Message, Model, StopReason};

    /// Replays canned results and records every request.
    #[derive(Default)]
    struct FakeSender {
        replies: Mutex<VecDeque<Result<Message>>>,
        requests: Mutex<Vec<MessageCreateParams>>,
    }

    impl FakeSender {
        fn reply(&self, text: &str, input: u64, output: u64) {
            self.replies.lock().unwrap().push_back(Ok(Message::new(
                format!("msg_{text}"),
                vec![ContentBlock::text(text)],
                Model::Known(KnownModel::ClaudeHaiku45),
                Usage::new(input, output),
            )));
        }

        fn fail(&self, err: Error) {
            self.replies.lock().unwrap().push_back(Err(err));
        }

        fn requests(&self) -> Vec<MessageCreateParams> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl MessageSender for FakeSender {
        async fn send(&self, params: MessageCreateParams) -> Result<Message> {
            self.requests.lock().unwrap().push(params);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::unknown("no canned reply")))
        }
    }

    struct Harness {
        storage: Arc<MemoryStorage>,
        sender: Arc<FakeSender>,
        sessions: SessionStore,
        usage: UsageTracker,
    }

    impl Harness {
        fn new() -> Self {
            let storage = Arc::new(MemoryStorage::new());
            Self {
                storage: storage.clone(),
                sender: Arc::new(FakeSender::default()),
                sessions: SessionStore::new(storage.clone()),
                usage: UsageTracker::new(storage),
            }
        }

        fn create(&self, config: InterviewConfig) -> Interview {
            Interview::create(
                config,
                self.sender.clone(),
                self.sessions.clone(),
                self.usage.clone(),
                4096,
            )
        }
    }

    fn text_turn(text: &str) -> Vec<ContentBlock> {
        vec![ContentBlock::text(text)]
    }

    #[tokio::test]
    async fn init_sends_hidden_trigger_once() {
        let h = Harness::new();
        h.sender.reply("Design a URL shortener.", 100, 20);
        let mut interview = h.create(InterviewConfig::new().with_topic("urls"));

        let outcome = interview.init_interview().await;
        assert!(matches!(outcome, TurnOutcome::Replied { ref text, .. } if text == "Design a URL shortener."));
        assert_eq!(interview.init_interview().await, TurnOutcome::Skipped);

        let requests = h.sender.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 4096);
        assert_eq!(requests[0].system.as_deref(), Some(interview.session().system_prompt.as_str()));
        assert_eq!(
            requests[0].messages,
            vec![MessageParam::user("Please begin the systems design interview.")]
        );

        let stored = h.sessions.get(&interview.session().id).unwrap();
        assert_eq!(stored.messages, vec![MessageParam::assistant("Design a URL shortener.")]);
        assert_eq!(
            stored.usage().get("claude-haiku-4-5").map(|t| (t.input_tokens, t.output_tokens)),
            Some((100, 20))
        );
    }

    #[tokio::test]
    async fn init_skipped_when_history_exists() {
        let h = Harness::new();
        h.sender.reply("Hello", 1, 1);
        let mut interview = h.create(InterviewConfig::new());
        interview.send_message(text_turn("hi")).await;
        let id = interview.session().id.clone();

        let mut reopened = Interview::open(
            &id,
            h.sender.clone(),
            h.sessions.clone(),
            h.usage.clone(),
            4096,
        )
        .unwrap();
        assert_eq!(reopened.transcript().len(), 2);
        assert_eq!(reopened.init_interview().await, TurnOutcome::Skipped);
        assert_eq!(h.sender.requests().len(), 1);
    }

    #[tokio::test]
    async fn send_message_appends_and_accumulates() {
        let h = Harness::new();
        h.sender.reply("First question?", 10, 5);
        h.sender.reply("Follow-up?", 30, 7);
        let mut interview = h.create(InterviewConfig::new());
        interview.init_interview().await;

        let outcome = interview.send_message(text_turn("My answer")).await;
        assert!(matches!(outcome, TurnOutcome::Replied { ref text, .. } if text == "Follow-up?"));

        let requests = h.sender.requests();
        assert_eq!(requests[1].messages.len(), 2);
        assert_eq!(requests[1].messages[0], MessageParam::assistant("First question?"));
        assert_eq!(requests[1].messages[1].role, MessageRole::User);

        let stored = h.sessions.get(&interview.session().id).unwrap();
        assert_eq!(stored.messages.len(), 3);
        let tokens = *stored.usage().get("claude-haiku-4-5").unwrap();
        assert_eq!((tokens.input_tokens, tokens.output_tokens), (40, 12));
        let all_time = *h.usage.all_time().get("claude-haiku-4-5").unwrap();
        assert_eq!((all_time.input_tokens, all_time.output_tokens), (40, 12));
        assert_eq!(interview.stats().message_count, 3);
    }

    #[tokio::test]
    async fn empty_turn_is_ignored() {
        let h = Harness::new();
        let mut interview = h.create(InterviewConfig::new());
        assert_eq!(interview.send_message(Vec::new()).await, TurnOutcome::Skipped);
        assert!(h.sender.requests().is_empty());
        assert!(interview.transcript().is_empty());
    }

    #[tokio::test]
    async fn authentication_failure_sets_banner() {
        let h = Harness::new();
        h.sender.fail(Error::authentication("invalid x-api-key"));
        let mut interview = h.create(InterviewConfig::new());
        let outcome = interview.init_interview().await;
        assert!(matches!(outcome, TurnOutcome::AuthenticationFailed(_)));
        assert!(interview.api_error().is_some());
        assert!(interview.transcript().is_empty());
        interview.clear_api_error();
        assert!(interview.api_error().is_none());
    }

    #[tokio::test]
    async fn textual_auth_failure_sets_banner() {
        let h = Harness::new();
        h.sender.fail(Error::unknown("Missing API key"));
        let mut interview = h.create(InterviewConfig::new());
        let outcome = interview.send_message(text_turn("hi")).await;
        assert!(matches!(outcome, TurnOutcome::AuthenticationFailed(_)));
        assert_eq!(interview.transcript().len(), 1);
    }

    #[tokio::test]
    async fn other_failure_becomes_assistant_error_message() {
        let h = Harness::new();
        h.sender.fail(Error::rate_limit("slow down", Some(3)));
        h.sender.reply("Welcome back.", 3, 3);
        let mut interview = h.create(InterviewConfig::new());
        let outcome = interview.send_message(text_turn("hello")).await;
        assert!(matches!(outcome, TurnOutcome::Failed(ref msg) if msg.contains("slow down")));
        let last = interview.transcript().last().unwrap();
        assert_eq!(last.role, MessageRole::Assistant);
        assert!(last.content.to_display_text().starts_with(ERROR_PREFIX));
        assert!(last.content.to_display_text().contains("slow down"));
        assert!(interview.api_error().is_none());

        let stored = h.sessions.get(&interview.session().id).unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[1].role, MessageRole::Assistant);

        // Roles keep alternating on the retry.
        interview.send_message(text_turn("retry")).await;
        let roles: Vec<MessageRole> = h.sender.requests()[1]
            .messages
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(interview.transcript().len(), 4);
    }

    #[tokio::test]
    async fn save_failure_sets_dismissible_flag() {
        let h = Harness::new();
        h.sender.reply("Question", 1, 1);
        let mut interview = h.create(InterviewConfig::new());
        assert!(!interview.save_error());
        h.storage.fail_writes(true);
        let outcome = interview.send_message(text_turn("answer")).await;
        assert!(matches!(outcome, TurnOutcome::Replied { .. }));
        assert!(interview.save_error());
        interview.dismiss_save_error();
        assert!(!interview.save_error());
    }

    #[tokio::test]
    async fn non_text_reply_and_truncation() {
        let h = Harness::new();
        let message = Message::new(
            "msg_1".to_string(),
            vec![ContentBlock::Unsupported],
            Model::Known(KnownModel::ClaudeHaiku45),
            Usage::new(1, 4096),
        )
        .with_stop_reason(StopReason::MaxTokens);
        h.sender.replies.lock().unwrap().push_back(Ok(message));
        let mut interview = h.create(InterviewConfig::new());
        let outcome = interview.init_interview().await;
        assert_eq!(
            outcome,
            TurnOutcome::Replied {
                text: "N/A".to_string(),
                usage: Usage::new(1, 4096),
                truncated: true,
            }
        );
    }

    #[tokio::test]
    async fn open_missing_session() {
        let h = Harness::new();
        let err = Interview::open(
            "nope",
            h.sender.clone(),
            h.sessions.clone(),
            h.usage.clone(),
            4096,
        )
        .err()
        .unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn open_migrates_legacy_usage() {
        let h = Harness::new();
        let mut session = InterviewSession::new(InterviewConfig::new());
        session.usage = None;
        h.sessions.save(&session).unwrap();
        let raw = h.storage.get_item(crate::storage::SESSIONS_KEY).unwrap().unwrap();
        let raw = raw.replacen(
            "\"messages\":[]",
            "\"messages\":[],\"usage\":{\"inputTokens\":5,\"outputTokens\":6}",
            1,
        );
        h.storage
            .set_item(crate::storage::SESSIONS_KEY, &raw)
            .unwrap();

        let interview = Interview::open(
            &session.id,
            h.sender.clone(),
            h.sessions.clone(),
            h.usage.clone(),
            4096,
        )
        .unwrap();
        let tokens = *interview.session_usage().get("claude-haiku-4-5").unwrap();
        assert_eq!((tokens.input_tokens, tokens.output_tokens), (5, 6));
        assert_eq!(interview.assistant_label(), "Interviewer");
    }
}
