//! Output rendering for interviews.
//!
//! This module provides a trait-based rendering abstraction so the REPL and
//! the `show` command can print transcripts with or without ANSI styling.

use std::io::{self, Write};

use crate::interview::ERROR_PREFIX;
use crate::types::{MessageParam, MessageParamContent, MessageRole};

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the assistant label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the user label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for warnings).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors and banners).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering interview output.
pub trait Renderer: Send {
    /// Print one transcript message with a speaker label.
    ///
    /// `assistant_label` names whoever the assistant is playing.
    fn print_message(&mut self, message: &MessageParam, assistant_label: &str);

    /// Print an inline error entry.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print a warning the user can dismiss.
    fn print_warning(&mut self, warning: &str);

    /// Print a persistent banner, such as an authentication failure.
    fn print_banner(&mut self, banner: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    out: Box<dyn Write + Send>,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), use_color)
    }

    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: Box<dyn Write + Send>, use_color: bool) -> Self {
        Self { out, use_color }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn emit(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &MessageParam, assistant_label: &str) {
        let label = match message.role {
            MessageRole::User => self.styled(&format!("{ANSI_BOLD}{ANSI_GREEN}"), "You:"),
            MessageRole::Assistant => self.styled(
                &format!("{ANSI_BOLD}{ANSI_CYAN}"),
                &format!("{assistant_label}:"),
            ),
        };
        self.emit(&format!("{label}\n{}\n", message.content.to_display_text()));
    }

    fn print_error(&mut self, error: &str) {
        let line = self.styled(ANSI_RED, &format!("**Error:** {error}"));
        self.emit(&format!("{line}\n"));
    }

    fn print_info(&mut self, info: &str) {
        let line = self.styled(ANSI_DIM, info);
        self.emit(&line);
    }

    fn print_warning(&mut self, warning: &str) {
        let line = self.styled(ANSI_YELLOW, &format!("Warning: {warning}"));
        self.emit(&line);
    }

    fn print_banner(&mut self, banner: &str) {
        let rule = "=".repeat(banner.chars().count().clamp(20, 78));
        let text = format!("{rule}\n{banner}\n{rule}");
        let text = self.styled(&format!("{ANSI_BOLD}{ANSI_RED}"), &text);
        self.emit(&text);
    }
}

/// Render every message of a transcript.  Recorded failures are printed as
/// errors.
pub fn render_transcript(
    renderer: &mut dyn Renderer,
    messages: &[MessageParam],
    assistant_label: &str,
) {
    for message in messages {
        match (&message.role, &message.content) {
            (MessageRole::Assistant, MessageParamContent::String(text))
                if text.starts_with(ERROR_PREFIX) =>
            {
                renderer.print_error(&text[ERROR_PREFIX.len()..]);
            }
            _ => renderer.print_message(message, assistant_label),
        }
    }
}
