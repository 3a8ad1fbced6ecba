//! Slash command parsing for the interview REPL.
//!
//! Input starting with `/` controls the composer and the session; it is never
//! sent to the API.

/// A parsed interview command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewCommand {
    /// Display help information.
    Help,

    /// Leave the interview.  The session stays resumable.
    Quit,

    /// Show this session's token usage and estimated cost.
    Usage,

    /// Start a fenced code part.  `None` uses the session's language.
    Code(Option<String>),

    /// Close the open code part.
    End,

    /// Attach an image file.
    Sketch(String),

    /// Submit the composed turn.
    Send,

    /// Drop every pending part.
    Discard,

    /// Show the interview configuration.
    ShowConfig,

    /// Hide the save-failure warning.
    Dismiss,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(InterviewCommand)` if the input is a command, or `None` if it
/// is part of the user's answer.
///
/// # Examples
///
/// ```
/// # use mimid::interview::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/code rust").is_some());
/// assert!(parse_command("I would shard by user id.").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<InterviewCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => InterviewCommand::Help,
        "quit" | "exit" | "q" => InterviewCommand::Quit,
        "usage" | "stats" => InterviewCommand::Usage,
        "code" => InterviewCommand::Code(argument.map(|s| s.to_lowercase())),
        "end" => InterviewCommand::End,
        "sketch" => match argument {
            Some(path) => InterviewCommand::Sketch(path.to_string()),
            None => InterviewCommand::Invalid("/sketch requires an image path".to_string()),
        },
        "send" => InterviewCommand::Send,
        "discard" => InterviewCommand::Discard,
        "config" => InterviewCommand::ShowConfig,
        "dismiss" => InterviewCommand::Dismiss,
        _ => InterviewCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Type an answer and press enter to send it.  To build a longer turn, use:
  /code [lang]           Start a code block; finish it with /end
  /end                   Close the open code block
  /sketch <path>         Attach an image (jpeg, png, gif, webp; up to 5 MB)
  /send                  Send everything composed so far
  /discard               Drop everything composed so far
While parts are pending, plain lines are added as text instead of sent.

Other commands:
  /usage                 Show tokens and estimated cost for this session
  /config                Show the interview configuration
  /dismiss               Hide the save-failure warning
  /help                  Show this help message
  /quit                  Leave the interview (resume it later)"#
}
