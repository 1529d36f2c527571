use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineSourceError {
    /// The user pressed Ctrl+C at the prompt.
    #[error("interrupted by the user")]
    Interrupted,
    #[error("can't read input: {0}")]
    Io(#[from] io::Error),
    #[error("line editor failed: {0}")]
    Editor(#[from] ReadlineError),
}

/// Where the interpreter gets its lines from.
pub trait LineSource {
    /// The next line without its line ending, or `None` once the source is exhausted.
    fn next_line(&mut self) -> Result<Option<String>, LineSourceError>;
}

/// Lines from any buffered reader: scripts, pipes, in-memory text.
///
/// Input is read as bytes, so a line that is not valid UTF-8 is decoded lossily
/// instead of failing the read.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    /// Wrap `reader`; lines are read on demand.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> Result<Option<String>, LineSourceError> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        // Bytes that are not UTF-8 become U+FFFD; the line is still parsed.
        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

/// Interactive lines from a `rustyline` editor, with history.
pub struct EditorSource {
    editor: DefaultEditor,
    prompt: String,
}

impl EditorSource {
    /// Start a `rustyline` editor that shows `prompt` before every line.
    pub fn new(prompt: impl Into<String>) -> Result<Self, LineSourceError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            prompt: prompt.into(),
        })
    }
}

impl LineSource for EditorSource {
    fn next_line(&mut self) -> Result<Option<String>, LineSourceError> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Err(LineSourceError::Interrupted),
            Err(e) => Err(e.into()),
        }
    }
}
