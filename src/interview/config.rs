//! Configuration types for interviews and the mimid application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration structures that sessions persist.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{KnownModel, Model};

/// Default maximum tokens per response.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Language used for coding interviews when none is chosen.
pub const DEFAULT_LANGUAGE: &str = "python";

/// Languages offered for coding interviews.
pub const LANGUAGES: [&str; 8] = [
    "python",
    "typescript",
    "javascript",
    "java",
    "go",
    "rust",
    "c++",
    "c#",
];

/// The kind of interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterviewType {
    /// Architecture and scaling discussion.
    #[serde(rename = "systems-design")]
    SystemsDesign,
    /// Algorithmic problem solving.
    #[serde(rename = "coding")]
    Coding,
    /// Past-experience questions.
    #[serde(rename = "behavioral")]
    Behavioral,
}

impl InterviewType {
    /// Every interview type, in the order they are offered.
    pub const ALL: [InterviewType; 3] = [
        InterviewType::SystemsDesign,
        InterviewType::Coding,
        InterviewType::Behavioral,
    ];

    /// The identifier used on the command line and in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::SystemsDesign => "systems-design",
            InterviewType::Coding => "coding",
            InterviewType::Behavioral => "behavioral",
        }
    }

    /// Title-case label for tables and headers.
    pub fn label(&self) -> &'static str {
        match self {
            InterviewType::SystemsDesign => "Systems Design",
            InterviewType::Coding => "Coding",
            InterviewType::Behavioral => "Behavioral",
        }
    }

    /// Lower-case phrase used in conversational text.
    pub fn phrase(&self) -> &'static str {
        match self {
            InterviewType::SystemsDesign => "systems design",
            InterviewType::Coding => "coding",
            InterviewType::Behavioral => "behavioral",
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterviewType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "systems-design" | "systems_design" | "system-design" => {
                Ok(InterviewType::SystemsDesign)
            }
            "coding" => Ok(InterviewType::Coding),
            "behavioral" => Ok(InterviewType::Behavioral),
            _ => Err(Error::validation(
                format!("unknown interview type {s:?} (expected systems-design, coding, or behavioral)"),
                Some("type".to_string()),
            )),
        }
    }
}

/// Which side of the table the user sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewRole {
    /// The user answers; the assistant interviews.
    Interviewee,
    /// The user asks; the assistant plays the candidate.
    Interviewer,
}

impl InterviewRole {
    /// The identifier used on the command line and in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewRole::Interviewee => "interviewee",
            InterviewRole::Interviewer => "interviewer",
        }
    }

    /// Who the assistant plays opposite this role.
    pub fn assistant_label(&self) -> &'static str {
        match self {
            InterviewRole::Interviewee => "Interviewer",
            InterviewRole::Interviewer => "Candidate",
        }
    }
}

impl fmt::Display for InterviewRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterviewRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "interviewee" => Ok(InterviewRole::Interviewee),
            "interviewer" => Ok(InterviewRole::Interviewer),
            _ => Err(Error::validation(
                format!("unknown role {s:?} (expected interviewee or interviewer)"),
                Some("role".to_string()),
            )),
        }
    }
}

/// Seniority of the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Junior,
    Mid,
    Senior,
    Staff,
}

impl Difficulty {
    /// The identifier used on the command line and in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Junior => "junior",
            Difficulty::Mid => "mid",
            Difficulty::Senior => "senior",
            Difficulty::Staff => "staff",
        }
    }

    /// Capitalized level, as used in prompts and tables.
    pub fn level(&self) -> &'static str {
        match self {
            Difficulty::Junior => "Junior",
            Difficulty::Mid => "Mid",
            Difficulty::Senior => "Senior",
            Difficulty::Staff => "Staff",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Ok(Difficulty::Junior),
            "mid" => Ok(Difficulty::Mid),
            "senior" => Ok(Difficulty::Senior),
            "staff" => Ok(Difficulty::Staff),
            _ => Err(Error::validation(
                format!("unknown difficulty {s:?} (expected junior, mid, senior, or staff)"),
                Some("difficulty".to_string()),
            )),
        }
    }
}

/// Command-line arguments describing a new interview.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct InterviewArgs {
    /// Interview type.
    #[arrrg(
        optional,
        "Interview type: systems-design, coding, behavioral (default: systems-design)",
        "TYPE"
    )]
    pub interview_type: Option<String>,

    /// The user's role.
    #[arrrg(optional, "Your role: interviewee, interviewer (default: interviewee)", "ROLE")]
    pub role: Option<String>,

    /// Candidate level.
    #[arrrg(optional, "Level: junior, mid, senior, staff (default: mid)", "LEVEL")]
    pub difficulty: Option<String>,

    /// Optional topic.
    #[arrrg(optional, "Topic or problem area (default: let the model choose)", "TOPIC")]
    pub topic: Option<String>,

    /// Preferred language for coding interviews.
    #[arrrg(optional, "Preferred language for coding interviews (default: python)", "LANG")]
    pub language: Option<String>,

    /// Model to interview with.
    #[arrrg(optional, "Model to use (default: claude-haiku-4-5)", "MODEL")]
    pub model: Option<String>,
}

/// The configuration an interview session is created with.
///
/// Persisted verbatim inside each session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// The kind of interview.
    #[serde(rename = "type")]
    pub interview_type: InterviewType,

    /// The user's role.
    pub role: InterviewRole,

    /// Candidate level.
    pub difficulty: Difficulty,

    /// Free-form topic; empty lets the model choose.
    #[serde(default)]
    pub topic: String,

    /// Preferred language.  Only meaningful for coding interviews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Model identifier.  Records written before models were selectable
    /// carry none.
    #[serde(default = "default_model")]
    pub model: Model,
}

fn default_model() -> Model {
    Model::Known(KnownModel::ClaudeHaiku45)
}

impl InterviewConfig {
    /// Creates a configuration with default values.
    ///
    /// Defaults:
    /// - Type: systems-design
    /// - Role: interviewee
    /// - Difficulty: mid
    /// - Topic: empty
    /// - Model: claude-haiku-4-5
    pub fn new() -> Self {
        Self {
            interview_type: InterviewType::SystemsDesign,
            role: InterviewRole::Interviewee,
            difficulty: Difficulty::Mid,
            topic: String::new(),
            language: None,
            model: default_model(),
        }
    }

    /// Sets the interview type.
    ///
    /// Switching to coding selects the default language when none is set;
    /// switching away clears it.
    pub fn with_type(mut self, interview_type: InterviewType) -> Self {
        self.interview_type = interview_type;
        if interview_type == InterviewType::Coding {
            if self.language.is_none() {
                self.language = Some(DEFAULT_LANGUAGE.to_string());
            }
        } else {
            self.language = None;
        }
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: InterviewRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Sets the topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Sets the preferred language.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// The topic with surrounding whitespace removed, or `None` when blank.
    pub fn topic(&self) -> Option<&str> {
        let topic = self.topic.trim();
        if topic.is_empty() { None } else { Some(topic) }
    }

    /// The preferred language, or `None` when unset or blank.
    pub fn language(&self) -> Option<&str> {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<InterviewArgs> for InterviewConfig {
    type Error = Error;

    fn try_from(args: InterviewArgs) -> Result<Self> {
        let mut config = InterviewConfig::new();
        if let Some(t) = args.interview_type.as_deref() {
            config = config.with_type(t.parse()?);
        }
        if let Some(role) = args.role.as_deref() {
            config = config.with_role(role.parse()?);
        }
        if let Some(difficulty) = args.difficulty.as_deref() {
            config = config.with_difficulty(difficulty.parse()?);
        }
        if let Some(topic) = args.topic {
            config = config.with_topic(topic);
        }
        if let Some(language) = args.language {
            if config.interview_type != InterviewType::Coding {
                return Err(Error::validation(
                    "--language only applies to coding interviews",
                    Some("language".to_string()),
                ));
            }
            let language = language.trim().to_lowercase();
            if !LANGUAGES.contains(&language.as_str()) {
                return Err(Error::validation(
                    format!(
                        "unsupported language {language:?} (expected one of {})",
                        LANGUAGES.join(", ")
                    ),
                    Some("language".to_string()),
                ));
            }
            config = config.with_language(Some(language));
        }
        if let Some(model) = args.model {
            let model = model.parse::<Model>().unwrap_or(Model::Custom(model));
            config = config.with_model(model);
        }
        Ok(config)
    }
}

/// Application-wide settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where sessions, usage, and the key are stored.  `None` uses the default.
    pub data_dir: Option<PathBuf>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Where client events are appended as JSON lines.
    pub log_file: Option<PathBuf>,

    /// Override for the API base URL.
    pub base_url: Option<String>,

    /// Maximum tokens per response.
    pub max_tokens: u32,
}

impl AppConfig {
    /// Creates an AppConfig with default values.
    pub fn new() -> Self {
        Self {
            data_dir: None,
            use_color: true,
            log_file: None,
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        self.data_dir = data_dir;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the client log file.
    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }

    /// Sets the base URL override.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
