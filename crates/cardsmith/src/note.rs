use cardsmith_common::{CardsmithError, Result};
use cardsmith_llm::{FragmentSink, TextFragment};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Prefix continuing a block quote after a line break
const QUOTE_CONTINUATION: &str = "\n> ";

/// Inclusive, 1-based line range selecting part of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| format!("expected START:END, got '{}'", s))?;
        let start: usize = start
            .trim()
            .parse()
            .map_err(|_| format!("invalid start line '{}'", start))?;
        let end: usize = end
            .trim()
            .parse()
            .map_err(|_| format!("invalid end line '{}'", end))?;
        if start == 0 || end < start {
            return Err(format!("invalid line range {}:{}", start, end));
        }
        Ok(Self { start, end })
    }
}

/// Markdown note being written, with an insertion cursor
#[derive(Debug, Clone)]
pub struct NoteDocument {
    path: Option<PathBuf>,
    content: String,
    cursor: usize,
    modified: bool,
}

impl NoteDocument {
    /// Load note from disk
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            CardsmithError::configuration(format!("Failed to read note {}: {}", path.display(), e))
        })?;
        debug!("Opened note {} ({} bytes)", path.display(), content.len());

        let cursor = content.len();
        Ok(Self {
            path: Some(path.to_path_buf()),
            content,
            cursor,
            modified: false,
        })
    }

    /// In-memory note without a backing file
    pub fn from_text(text: impl Into<String>) -> Self {
        let content = text.into();
        let cursor = content.len();
        Self {
            path: None,
            content,
            cursor,
            modified: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether anything was inserted since opening
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Selected lines, or the whole note without a range
    pub fn selection(&self, range: Option<LineRange>) -> Result<String> {
        let Some(range) = range else {
            return Ok(self.content.clone());
        };

        let lines: Vec<&str> = self.content.lines().collect();
        if range.start > lines.len() {
            return Err(CardsmithError::configuration(format!(
                "Line range {}:{} is outside the note ({} lines)",
                range.start,
                range.end,
                lines.len()
            )));
        }
        let end = range.end.min(lines.len());
        Ok(lines[range.start - 1..end].join("\n"))
    }

    /// Move the cursor to the end and open a tagged block quote
    pub fn begin_block(&mut self, tag: &str) {
        self.cursor = self.content.len();
        self.insert(&format!("\n\n> {}\n> \n> ", tag));
    }

    /// Insert generated text at the cursor, continuing the block quote
    pub fn insert_fragment(&mut self, text: &str) {
        let quoted = text.replace('\n', QUOTE_CONTINUATION);
        self.insert(&quoted);
    }

    fn insert(&mut self, text: &str) {
        self.content.insert_str(self.cursor, text);
        self.cursor += text.len();
        self.modified = true;
    }

    /// Write the note back to its file
    pub async fn save(&self) -> Result<()> {
        let (Some(path), true) = (&self.path, self.modified) else {
            return Ok(());
        };
        tokio::fs::write(path, &self.content).await?;
        debug!("Saved note {} ({} bytes)", path.display(), self.content.len());
        Ok(())
    }
}

/// Sink writing fragments into a note, optionally echoing them to stdout
pub struct NoteRelay<'a> {
    note: &'a mut NoteDocument,
    tag: String,
    echo: bool,
    started: bool,
    fragments: usize,
}

impl<'a> NoteRelay<'a> {
    pub fn new(note: &'a mut NoteDocument, tag: impl Into<String>, echo: bool) -> Self {
        Self {
            note,
            tag: tag.into(),
            echo,
            started: false,
            fragments: 0,
        }
    }

    /// Number of fragments written so far
    pub fn fragments(&self) -> usize {
        self.fragments
    }
}

impl FragmentSink for NoteRelay<'_> {
    fn fragment(&mut self, fragment: &TextFragment) -> Result<()> {
        self.note.insert_fragment(fragment.as_str());
        self.fragments += 1;

        if self.echo {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(fragment.as_str().as_bytes())?;
            stdout.flush()?;
        }
        Ok(())
    }

    fn begin_batch(&mut self, index: usize, label: &str) -> Result<()> {
        debug!("Writing batch {} ({})", index, label);
        if self.started {
            // Blank quoted line between batches
            self.note.insert_fragment("\n\n");
            if self.echo {
                println!("\n");
            }
        } else {
            self.note.begin_block(&self.tag);
            self.started = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_range_parse() {
        assert_eq!("2:4".parse::<LineRange>().unwrap(), LineRange { start: 2, end: 4 });
        assert!("0:3".parse::<LineRange>().is_err());
        assert!("5:2".parse::<LineRange>().is_err());
        assert!("abc".parse::<LineRange>().is_err());
    }

    #[test]
    fn test_selection() {
        let note = NoteDocument::from_text("one\ntwo\nthree\nfour");
        assert_eq!(note.selection(None).unwrap(), "one\ntwo\nthree\nfour");
        assert_eq!(
            note.selection(Some(LineRange { start: 2, end: 3 })).unwrap(),
            "two\nthree"
        );
        assert_eq!(
            note.selection(Some(LineRange { start: 3, end: 10 })).unwrap(),
            "three\nfour"
        );
        assert!(note.selection(Some(LineRange { start: 9, end: 10 })).is_err());
    }

    #[test]
    fn test_fragments_are_block_quoted_at_cursor() {
        let mut note = NoteDocument::from_text("# Biology");
        note.begin_block("#flashcards");
        note.insert_fragment("START\nBa");
        note.insert_fragment("sic\nQ");
        note.insert_fragment("\nBack: A\nEND");

        assert_eq!(
            note.text(),
            "# Biology\n\n> #flashcards\n> \n> START\n> Basic\n> Q\n> Back: A\n> END"
        );
        assert_eq!(note.cursor(), note.text().len());
        assert!(note.is_modified());
    }

    #[test]
    fn test_relay_separates_batches() {
        let mut note = NoteDocument::from_text("note");
        {
            let mut relay = NoteRelay::new(&mut note, "#cards", false);
            relay.begin_batch(0, "Basic x1").unwrap();
            relay.fragment(&TextFragment::new("START\nEND")).unwrap();
            relay.begin_batch(1, "Cloze x1").unwrap();
            relay.fragment(&TextFragment::new("START\nEND")).unwrap();
            assert_eq!(relay.fragments(), 2);
        }
        assert_eq!(
            note.text(),
            "note\n\n> #cards\n> \n> START\n> END\n> \n> START\n> END"
        );
    }

    #[tokio::test]
    async fn test_open_and_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        tokio::fs::write(&path, "Mitochondria").await.unwrap();

        let mut note = NoteDocument::open(&path).await.unwrap();
        note.begin_block("#flashcards");
        note.insert_fragment("START");
        note.save().await.unwrap();

        let saved = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(saved, "Mitochondria\n\n> #flashcards\n> \n> START");
    }

    #[tokio::test]
    async fn test_open_missing_note() {
        let result = NoteDocument::open("/nonexistent/note.md").await;
        assert!(matches!(result, Err(CardsmithError::Configuration(_))));
    }
}
