//! Mock-interview practice in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Store an API key once
//! mimid key set sk-ant-...
//!
//! # Start a senior-level coding interview in rust
//! mimid --interview-type coding --difficulty senior --language rust new
//!
//! # Play the interviewer instead
//! mimid --role interviewer --topic "design a chat service" new
//!
//! # Browse, reopen, export
//! mimid history
//! mimid resume 3f2a9c1e
//! mimid --format yaml show 3f2a9c1e
//! ```
//!
//! # Commands
//!
//! While interviewing, type `/help` for the composer and session commands.

use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use time::OffsetDateTime;

use mimid::interview::{
    AppConfig, DEFAULT_MAX_TOKENS, InterviewArgs, InterviewCommand, InterviewConfig,
    InterviewType, help_text, parse_command,
};
use mimid::pricing::{
    CONTEXT_WINDOW, calculate_cost, calculate_total_cost, display_name, format_cost,
    format_token_count, with_separators,
};
use mimid::render::render_transcript;
use mimid::sessions::filter;
use mimid::{
    Anthropic, ApiKeyStore, Composer, ContentBlock, FileStorage, Interview, InterviewSession,
    JsonlLogger, MessageParam, PlainTextRenderer, Renderer, SessionStore, SessionUsage, Storage,
    TurnOutcome, UsageTracker,
};

const USAGE: &str = "mimid [OPTIONS] <new|resume <id>|history [text]|show <id>|delete <id>|key <set <key>|show|remove>|usage [reset]>";

/// Output format for `show`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum OutputFormat {
    /// Plain text transcript (default).
    #[default]
    Text,
    /// The stored session as JSON.
    Json,
    /// The stored session as YAML.
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Invalid output format: {}. Valid options: text, json, yaml",
                s
            )),
        }
    }
}

/// Command-line arguments for mimid.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Interview type: systems-design, coding, behavioral", "TYPE")]
    interview_type: Option<String>,

    #[arrrg(optional, "Your role: interviewee, interviewer (default: interviewee)", "ROLE")]
    role: Option<String>,

    #[arrrg(optional, "Level: junior, mid, senior, staff (default: mid)", "LEVEL")]
    difficulty: Option<String>,

    #[arrrg(optional, "Topic or problem area (default: let the model choose)", "TOPIC")]
    topic: Option<String>,

    #[arrrg(optional, "Preferred language for coding interviews (default: python)", "LANG")]
    language: Option<String>,

    #[arrrg(optional, "Model to use (default: claude-haiku-4-5)", "MODEL")]
    model: Option<String>,

    #[arrrg(optional, "Output format for show: text, json, yaml", "FORMAT")]
    format: Option<String>,

    #[arrrg(optional, "Max tokens per response (default: 4096)", "TOKENS")]
    max_tokens: Option<u32>,

    #[arrrg(optional, "Where sessions and the API key are stored", "DIR")]
    data_dir: Option<String>,

    #[arrrg(optional, "Append API requests and responses to this file as JSON lines", "FILE")]
    log_file: Option<String>,

    #[arrrg(optional, "Override the API base URL", "URL")]
    base_url: Option<String>,

    #[arrrg(flag, "Disable ANSI colors/styles")]
    no_color: bool,
}

impl Args {
    fn interview_args(&self) -> InterviewArgs {
        InterviewArgs {
            interview_type: self.interview_type.clone(),
            role: self.role.clone(),
            difficulty: self.difficulty.clone(),
            topic: self.topic.clone(),
            language: self.language.clone(),
            model: self.model.clone(),
        }
    }

    fn app_config(&self) -> AppConfig {
        let config = AppConfig::new()
            .with_data_dir(self.data_dir.as_ref().map(PathBuf::from))
            .with_log_file(self.log_file.as_ref().map(PathBuf::from))
            .with_base_url(self.base_url.clone())
            .with_max_tokens(self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS));
        if self.no_color {
            config.without_color()
        } else {
            config
        }
    }
}

/// Everything a subcommand needs.
struct App {
    config: AppConfig,
    storage: Arc<dyn Storage>,
}

impl App {
    fn open(config: AppConfig) -> mimid::Result<Self> {
        let storage = match &config.data_dir {
            Some(dir) => FileStorage::new(dir),
            None => FileStorage::open_default()?,
        };
        Ok(Self {
            config,
            storage: Arc::new(storage),
        })
    }

    fn sessions(&self) -> SessionStore {
        SessionStore::new(Arc::clone(&self.storage))
    }

    fn usage(&self) -> UsageTracker {
        UsageTracker::new(Arc::clone(&self.storage))
    }

    fn keys(&self) -> ApiKeyStore {
        ApiKeyStore::new(Arc::clone(&self.storage))
    }

    fn renderer(&self) -> PlainTextRenderer {
        PlainTextRenderer::with_color(self.config.use_color)
    }

    fn client(&self) -> Result<Arc<Anthropic>, Box<dyn StdError>> {
        let Some(key) = self.keys().resolve() else {
            return Err("No API key found. Run `mimid key set <key>` or set MIMID_API_KEY.".into());
        };
        let mut client = Anthropic::with_options(Some(key), self.config.base_url.clone(), None)?;
        if let Some(path) = &self.config.log_file {
            client = client.with_logger(Arc::new(JsonlLogger::open(path)?));
        }
        Ok(Arc::new(client))
    }

    /// Resolve a full id or unique id prefix.
    fn resolve_session(&self, id: &str) -> Result<InterviewSession, Box<dyn StdError>> {
        let mut matches = self.sessions().find_by_prefix(id);
        match matches.len() {
            0 => Err(format!("No interview session matches {id}").into()),
            1 => Ok(matches.remove(0)),
            n => Err(format!("{n} interview sessions match {id}; use more of the id").into()),
        }
    }
}

/// Main entry point for mimid.
#[tokio::main]
async fn main() -> Result<(), Box<dyn StdError>> {
    let (args, free) = Args::from_command_line_relaxed(USAGE);
    let free: Vec<&str> = free.iter().map(String::as_str).collect();
    let app = App::open(args.app_config())?;

    match free.as_slice() {
        ["new"] => cmd_new(&app, &args).await,
        ["resume", id] => cmd_resume(&app, id).await,
        ["history", rest @ ..] => cmd_history(&app, &args, &rest.join(" ")),
        ["show", id] => cmd_show(&app, &args, id),
        ["delete", id] => cmd_delete(&app, id),
        ["key", "set", key] => {
            app.keys().save(key)?;
            println!("API key saved.");
            Ok(())
        }
        ["key", "show"] | ["key"] => cmd_key_show(&app),
        ["key", "remove"] => {
            app.keys().delete()?;
            println!("API key removed.");
            Ok(())
        }
        ["usage"] => cmd_usage(&app),
        ["usage", "reset"] => {
            app.usage().reset()?;
            println!("All-time usage reset.");
            Ok(())
        }
        _ => {
            eprintln!("USAGE: {USAGE}");
            std::process::exit(2);
        }
    }
}

async fn cmd_new(app: &App, args: &Args) -> Result<(), Box<dyn StdError>> {
    let config = InterviewConfig::try_from(args.interview_args())?;
    let client = app.client()?;
    let mut interview = Interview::create(
        config,
        client,
        app.sessions(),
        app.usage(),
        app.config.max_tokens,
    );
    run_interview(app, &mut interview).await
}

async fn cmd_resume(app: &App, id: &str) -> Result<(), Box<dyn StdError>> {
    let session = app.resolve_session(id)?;
    let client = app.client()?;
    let mut interview = Interview::open(
        &session.id,
        client,
        app.sessions(),
        app.usage(),
        app.config.max_tokens,
    )?;
    run_interview(app, &mut interview).await
}

fn cmd_history(app: &App, args: &Args, text: &str) -> Result<(), Box<dyn StdError>> {
    let type_filter = args
        .interview_type
        .as_deref()
        .map(str::parse::<InterviewType>)
        .transpose()?;
    let sessions = filter(&app.sessions().list(), type_filter, text);
    if sessions.is_empty() {
        println!("No interviews yet. Start one with `mimid new`.");
        return Ok(());
    }
    println!(
        "{:<8}  {:<16}  {:<14}  {:<11}  {:<6}  {:>5}  {:>9}  TOPIC",
        "ID", "CREATED", "TYPE", "ROLE", "LEVEL", "MSGS", "COST"
    );
    for session in &sessions {
        let topic = session.config.topic().unwrap_or("—");
        println!(
            "{:<8}  {:<16}  {:<14}  {:<11}  {:<6}  {:>5}  {:>9}  {}",
            session.short_id(),
            format_created(session.created_at),
            session.config.interview_type.label(),
            capitalize(session.config.role.as_str()),
            session.config.difficulty.level(),
            session.messages.len(),
            format_cost(calculate_total_cost(&session.usage())),
            topic,
        );
    }
    Ok(())
}

fn cmd_show(app: &App, args: &Args, id: &str) -> Result<(), Box<dyn StdError>> {
    let format = args
        .format
        .as_deref()
        .map(str::parse::<OutputFormat>)
        .transpose()?
        .unwrap_or_default();
    let session = app.resolve_session(id)?;
    match format {
        OutputFormat::Text => {
            let mut renderer = app.renderer();
            print_config(&mut renderer, &session);
            renderer.print_info("");
            render_transcript(
                &mut renderer,
                &session.messages,
                session.config.role.assistant_label(),
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&session)?),
    }
    Ok(())
}

fn cmd_delete(app: &App, id: &str) -> Result<(), Box<dyn StdError>> {
    let session = app.resolve_session(id)?;
    app.sessions().delete(&session.id);
    println!("Deleted interview {}.", session.short_id());
    Ok(())
}

fn cmd_key_show(app: &App) -> Result<(), Box<dyn StdError>> {
    let keys = app.keys();
    match keys.masked() {
        Some(masked) => println!("Stored API key: {masked}"),
        None => println!("No API key saved. Run `mimid key set <key>`."),
    }
    if std::env::var_os(mimid::client::API_KEY_ENV).is_some() {
        println!("MIMID_API_KEY is set and takes precedence.");
    }
    Ok(())
}

fn cmd_usage(app: &App) -> Result<(), Box<dyn StdError>> {
    let usage = app.usage().all_time();
    if usage.is_empty() {
        println!("No usage recorded yet. Start an interview to see costs.");
        return Ok(());
    }
    print_usage(&usage, "All-time usage");
    println!("Costs are estimates; see https://www.anthropic.com/pricing");
    Ok(())
}

/// Run the REPL for one interview.
async fn run_interview(app: &App, interview: &mut Interview) -> Result<(), Box<dyn StdError>> {
    let mut renderer = app.renderer();
    let mut rl = DefaultEditor::new()?;
    let mut composer = Composer::new();

    // Requests cannot be cancelled; Ctrl+C while waiting is reported, not fatal.
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    print_config(&mut renderer, interview.session());
    renderer.print_info("Type /help for commands, /quit to leave.\n");
    render_transcript(
        &mut renderer,
        interview.transcript(),
        interview.assistant_label(),
    );

    if interview.transcript().is_empty() {
        renderer.print_info("Starting the interview...");
        let outcome = interview.init_interview().await;
        report(&mut renderer, interview, outcome, &interrupted);
    }

    loop {
        interrupted.store(false, Ordering::Relaxed);
        let prompt = if composer.in_code() {
            "... "
        } else if !composer.is_empty() {
            "+ "
        } else {
            "You: "
        };

        match rl.readline(prompt) {
            Ok(line) => {
                if composer.in_code() {
                    if line.trim() == "/end" {
                        composer.end_code();
                        renderer.print_info("Code block added. /send when ready.");
                    } else {
                        composer.push_code_line(line);
                    }
                    continue;
                }

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                let Some(cmd) = parse_command(line) else {
                    if composer.is_empty() {
                        let outcome = interview.send_message(vec![ContentBlock::text(line)]).await;
                        report(&mut renderer, interview, outcome, &interrupted);
                    } else {
                        composer.push_text(line);
                    }
                    continue;
                };

                match cmd {
                    InterviewCommand::Quit => {
                        println!("Session saved as {}. Resume with `mimid resume {}`.",
                            interview.session().short_id(),
                            interview.session().short_id());
                        break;
                    }
                    InterviewCommand::Help => {
                        for line in help_text().lines() {
                            println!("    {}", line);
                        }
                    }
                    InterviewCommand::Usage => {
                        print_usage(&interview.session_usage(), "Session usage");
                    }
                    InterviewCommand::Code(language) => {
                        let language = language
                            .or_else(|| interview.session().config.language().map(String::from))
                            .unwrap_or_default();
                        composer.begin_code(language);
                        renderer.print_info("Enter code; finish with /end.");
                    }
                    InterviewCommand::End => {
                        renderer.print_error("No code block is open.");
                    }
                    InterviewCommand::Sketch(path) => {
                        composer.push_sketch(&path);
                        renderer.print_info(&format!("Attached {path}. /send when ready."));
                    }
                    InterviewCommand::Send => {
                        let turn = composer.take();
                        for skipped in &turn.skipped {
                            renderer.print_warning(&format!("Skipped sketch {skipped}"));
                        }
                        if turn.blocks.is_empty() {
                            renderer.print_info("Nothing to send.");
                            continue;
                        }
                        let outcome = interview.send_message(turn.blocks).await;
                        report(&mut renderer, interview, outcome, &interrupted);
                    }
                    InterviewCommand::Discard => {
                        composer.clear();
                        renderer.print_info("Discarded the pending turn.");
                    }
                    InterviewCommand::ShowConfig => {
                        print_config(&mut renderer, interview.session());
                    }
                    InterviewCommand::Dismiss => {
                        interview.dismiss_save_error();
                        interview.clear_api_error();
                    }
                    InterviewCommand::Invalid(message) => {
                        renderer.print_error(&message);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn report(
    renderer: &mut PlainTextRenderer,
    interview: &Interview,
    outcome: TurnOutcome,
    interrupted: &AtomicBool,
) {
    match outcome {
        TurnOutcome::Skipped => {}
        TurnOutcome::Replied {
            text, truncated, ..
        } => {
            println!();
            renderer.print_message(&MessageParam::assistant(text), interview.assistant_label());
            if truncated {
                renderer.print_warning("The reply reached the token limit and was cut short.");
            }
        }
        TurnOutcome::AuthenticationFailed(message) => {
            renderer.print_banner(&format!(
                "Authentication failed: {message}\nCheck your key with `mimid key set <key>`, then resume this session."
            ));
        }
        TurnOutcome::Failed(message) => renderer.print_error(&message),
    }
    if interview.save_error() {
        renderer.print_warning(
            "This session could not be saved to disk. Type /dismiss to hide this warning.",
        );
    }
    if interrupted.swap(false, Ordering::Relaxed) {
        renderer.print_info("(Ctrl+C is ignored while waiting for a reply.)");
    }
}

fn print_config(renderer: &mut PlainTextRenderer, session: &InterviewSession) {
    let config = &session.config;
    renderer.print_info(&format!(
        "{} interview, {} level, you are the {}",
        config.interview_type.label(),
        config.difficulty.level(),
        config.role,
    ));
    renderer.print_info(&format!("  Topic: {}", config.topic().unwrap_or("—")));
    if config.interview_type == InterviewType::Coding {
        renderer.print_info(&format!("  Language: {}", config.language().unwrap_or("—")));
    }
    renderer.print_info(&format!("  Model: {}", display_name(&config.model.to_string())));
    renderer.print_info(&format!(
        "  Session: {} (created {})",
        session.id,
        format_created(session.created_at)
    ));
}

fn print_usage(usage: &SessionUsage, title: &str) {
    println!("    {title}:");
    if usage.is_empty() {
        println!("      (none)");
        return;
    }
    for (model, tokens) in usage.iter() {
        println!(
            "      {}: {} in / {} out, {}",
            display_name(model),
            with_separators(tokens.input_tokens),
            with_separators(tokens.output_tokens),
            format_cost(calculate_cost(
                model,
                tokens.input_tokens,
                tokens.output_tokens
            )),
        );
    }
    let totals = usage.totals();
    println!(
        "      Total: {} tokens, {} (context window {})",
        format_token_count(totals.total()),
        format_cost(calculate_total_cost(usage)),
        format_token_count(CONTEXT_WINDOW),
    );
}

fn format_created(created: OffsetDateTime) -> String {
    created
        .format(time::macros::format_description!(
            "[year]-[month]-[day] [hour]:[minute]"
        ))
        .unwrap_or_default()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
