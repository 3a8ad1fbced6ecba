//! Assemble a user turn from prose, fenced code, and sketches.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::{Base64ImageSource, ContentBlock, ImageBlock, TextBlock};

/// One piece of a turn being composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerPart {
    /// Markdown prose.
    Text(String),
    /// A code listing, rendered as a fenced block.
    Code { language: String, code: String },
    /// An image file to attach.
    Sketch(PathBuf),
}

/// A sketch that could not be attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSketch {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for SkippedSketch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Content blocks for a turn, plus the sketches that were dropped.
#[derive(Debug, Default)]
pub struct ComposedTurn {
    pub blocks: Vec<ContentBlock>,
    pub skipped: Vec<SkippedSketch>,
}

/// Accumulates parts until the turn is submitted.
///
/// Code is captured line by line between [`Composer::begin_code`] and
/// [`Composer::end_code`].
#[derive(Debug, Default, Clone)]
pub struct Composer {
    parts: Vec<ComposerPart>,
    open_code: Option<(String, Vec<String>)>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.parts.push(ComposerPart::Text(text.into()));
    }

    pub fn push_code(&mut self, language: impl Into<String>, code: impl Into<String>) {
        self.parts.push(ComposerPart::Code {
            language: language.into(),
            code: code.into(),
        });
    }

    pub fn push_sketch(&mut self, path: impl Into<PathBuf>) {
        self.parts.push(ComposerPart::Sketch(path.into()));
    }

    /// Start capturing a code listing.  An already open listing is closed first.
    pub fn begin_code(&mut self, language: impl Into<String>) {
        self.end_code();
        self.open_code = Some((language.into(), Vec::new()));
    }

    /// Whether a code listing is being captured.
    pub fn in_code(&self) -> bool {
        self.open_code.is_some()
    }

    /// Add one line to the open code listing.  Returns false when none is open.
    pub fn push_code_line(&mut self, line: impl Into<String>) -> bool {
        match &mut self.open_code {
            Some((_, lines)) => {
                lines.push(line.into());
                true
            }
            None => false,
        }
    }

    /// Close the open code listing, keeping it as a part.  Returns false when
    /// none was open.
    pub fn end_code(&mut self) -> bool {
        match self.open_code.take() {
            Some((language, lines)) => {
                self.push_code(language, lines.join("\n"));
                true
            }
            None => false,
        }
    }

    pub fn parts(&self) -> &[ComposerPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.open_code.is_none()
    }

    /// Drop every pending part, including an open code listing.
    pub fn clear(&mut self) {
        self.parts.clear();
        self.open_code = None;
    }

    /// Build the turn and reset the composer.  An open code listing is closed.
    pub fn take(&mut self) -> ComposedTurn {
        self.end_code();
        let parts = std::mem::take(&mut self.parts);
        compose(&parts)
    }
}

/// Build content blocks from `parts`.
///
/// Text and code parts are joined into a single markdown text block, emitted
/// first and only when it has non-whitespace content.  Each sketch that can be
/// read becomes an image block, in order.
pub fn compose(parts: &[ComposerPart]) -> ComposedTurn {
    let mut markdown = Vec::new();
    let mut images = Vec::new();
    let mut skipped = Vec::new();
    for part in parts {
        match part {
            ComposerPart::Text(text) => markdown.push(text.clone()),
            ComposerPart::Code { language, code } => markdown.push(fence(language, code)),
            ComposerPart::Sketch(path) => match load_sketch(path) {
                Ok(source) => images.push(ContentBlock::Image(ImageBlock::new(source))),
                Err(reason) => skipped.push(SkippedSketch {
                    path: path.clone(),
                    reason,
                }),
            },
        }
    }

    let mut blocks = Vec::with_capacity(images.len() + 1);
    let text = TextBlock::new(markdown.join("\n\n"));
    if !text.is_blank() {
        blocks.push(ContentBlock::Text(text));
    }
    blocks.extend(images);
    ComposedTurn { blocks, skipped }
}

/// Render a fenced code block.
pub fn fence(language: &str, code: &str) -> String {
    let code = code.strip_suffix('\n').unwrap_or(code);
    format!("```{}\n{}\n```", language.trim(), code)
}

fn load_sketch(path: &Path) -> Result<Base64ImageSource, String> {
    Base64ImageSource::from_path(path).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_code_join_into_one_block() {
        let mut composer = Composer::new();
        composer.push_text("Here is my approach:");
        composer.push_code("python", "def f():\n    return 1\n");
        composer.push_text("Thoughts?");
        let turn = composer.take();
        assert!(composer.is_empty());
        assert_eq!(turn.blocks.len(), 1);
        assert_eq!(
            turn.blocks[0].as_text().map(|t| t.text.as_str()),
            Some("Here is my approach:\n\n```python\ndef f():\n    return 1\n```\n\nThoughts?")
        );
    }

    #[test]
    fn code_capture() {
        let mut composer = Composer::new();
        assert!(!composer.push_code_line("orphan"));
        composer.begin_code("go");
        assert!(composer.in_code());
        assert!(!composer.is_empty());
        composer.push_code_line("func main() {");
        composer.push_code_line("}");
        assert!(composer.end_code());
        assert!(!composer.in_code());
        assert!(!composer.end_code());
        assert_eq!(
            composer.parts(),
            &[ComposerPart::Code {
                language: "go".to_string(),
                code: "func main() {\n}".to_string(),
            }]
        );

        composer.begin_code("sql");
        composer.push_code_line("select 1;");
        let turn = composer.take();
        assert_eq!(
            turn.blocks[0].as_text().map(|t| t.text.as_str()),
            Some("```go\nfunc main() {\n}\n```\n\n```sql\nselect 1;\n```")
        );

        composer.begin_code("c");
        composer.clear();
        assert!(composer.is_empty());
    }

    #[test]
    fn blank_text_is_dropped() {
        let turn = compose(&[ComposerPart::Text("   \n".to_string())]);
        assert!(turn.blocks.is_empty());
        assert!(turn.skipped.is_empty());
    }

    #[test]
    fn sketches_follow_text() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("a.png");
        std::fs::write(&png, [0x89, b'P', b'N', b'G']).unwrap();
        let jpg = dir.path().join("b.jpg");
        std::fs::write(&jpg, [0xff, 0xd8, 0xff]).unwrap();

        let turn = compose(&[
            ComposerPart::Sketch(png),
            ComposerPart::Text("see sketches".to_string()),
            ComposerPart::Sketch(jpg),
        ]);
        assert_eq!(turn.blocks.len(), 3);
        assert_eq!(turn.blocks[0].as_text().map(|t| t.text.as_str()), Some("see sketches"));
        let first = turn.blocks[1].as_image().unwrap();
        assert_eq!(first.source.media_type.to_string(), "image/png");
        let second = turn.blocks[2].as_image().unwrap();
        assert_eq!(second.source.media_type.to_string(), "image/jpeg");
        assert_eq!(second.source.data, "/9j/");
    }

    #[test]
    fn bad_sketches_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.png");
        std::fs::write(&empty, b"").unwrap();
        let wrong = dir.path().join("notes.txt");
        std::fs::write(&wrong, "hi").unwrap();
        let missing = dir.path().join("missing.png");

        let turn = compose(&[
            ComposerPart::Sketch(empty.clone()),
            ComposerPart::Sketch(wrong.clone()),
            ComposerPart::Sketch(missing.clone()),
        ]);
        assert!(turn.blocks.is_empty());
        let paths: Vec<PathBuf> = turn.skipped.iter().map(|s| s.path.clone()).collect();
        assert_eq!(paths, vec![empty, wrong, missing]);
    }

    #[test]
    fn oversized_sketch_is_skipped_and_text_kept() {
        let dir = tempfile::tempdir().unwrap();
        let huge = dir.path().join("whiteboard.png");
        std::fs::File::create(&huge)
            .unwrap()
            .set_len(crate::types::MAX_IMAGE_BYTES + 1)
            .unwrap();

        let turn = compose(&[
            ComposerPart::Text("See the attached board.".to_string()),
            ComposerPart::Sketch(huge.clone()),
        ]);
        assert_eq!(turn.blocks.len(), 1);
        assert!(turn.blocks[0].as_text().is_some());
        assert_eq!(turn.skipped.len(), 1);
        assert_eq!(turn.skipped[0].path, huge);
        assert!(turn.skipped[0].reason.contains("limit"));
    }

    #[test]
    fn fence_trims_one_trailing_newline() {
        assert_eq!(fence("rust", "fn main() {}\n"), "```rust\nfn main() {}\n```");
        assert_eq!(fence("", "x"), "```\nx\n```");
    }
}
