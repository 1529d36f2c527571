use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Backspace + prompt character, written after every message so the prompt stays last.
const PROMPT: &str = "\u{8}>";

/// Bracketed tag that prefixes a console message.
///
/// The closing brace is intentionally `}`: existing logs use exactly this shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    System,
    Error,
    Warning,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::System => "[SYSTEM}",
            Tag::Error => "[ERROR}",
            Tag::Warning => "[WARNING}",
        }
    }
}

/// Append-only session log. The file is opened and closed for every entry.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{entry}")
    }
}

/// The one print path shared by the session controller and the worker.
///
/// Every message goes to the output writer and, when configured, to the session log.
/// Output and log writes happen under one lock so the log keeps the console order.
pub struct Console {
    out: Mutex<Box<dyn Write + Send>>,
    log: Option<LogFile>,
    redraw_prompt: bool,
}

impl Console {
    /// Console writing to `out`, without a log file, redrawing the prompt.
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            log: None,
            redraw_prompt: true,
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log = path.map(LogFile::new);
        self
    }

    /// Turn the `>` prompt redraw off, for line editors that draw their own prompt.
    pub fn with_prompt(mut self, redraw: bool) -> Self {
        self.redraw_prompt = redraw;
        self
    }

    pub fn log_file(&self) -> Option<&LogFile> {
        self.log.as_ref()
    }

    /// Redraw the prompt.
    pub fn prompt(&self) {
        if self.redraw_prompt {
            let mut out = self.lock();
            write_out(&mut out, PROMPT);
        }
    }

    /// Print a timestamped message and record it in the log.
    pub fn print(&self, text: &str) {
        if text == ">" {
            self.prompt();
            return;
        }
        let entry = format!("{}{}", timestamp(), text);
        let mut out = self.lock();
        if self.redraw_prompt {
            write_out(&mut out, &format!("\u{8}{entry}\n>"));
        } else {
            write_out(&mut out, &format!("{entry}\n"));
        }
        self.append_log(&entry);
    }

    pub fn tagged(&self, tag: Tag, text: &str) {
        self.print(&format!("{} {}", tag.as_str(), text));
    }

    pub fn system(&self, text: &str) {
        self.tagged(Tag::System, text);
    }

    pub fn error(&self, text: &str) {
        self.tagged(Tag::Error, text);
    }

    pub fn warning(&self, text: &str) {
        self.tagged(Tag::Warning, text);
    }

    /// Write bytes as-is: no timestamp, no prompt handling, no log entry.
    pub fn raw(&self, text: &str) {
        let mut out = self.lock();
        write_out(&mut out, text);
    }

    /// Record a raw input line as `>line`.
    pub fn log_input(&self, line: &str) {
        let _out = self.lock();
        self.append_log(&format!(">{line}"));
    }

    /// Record an entry in the log without printing it.
    pub fn log(&self, entry: &str) {
        let _out = self.lock();
        self.append_log(entry);
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append_log(&self, entry: &str) {
        if let Some(log) = &self.log {
            if let Err(e) = log.append(entry) {
                log::warn!("can't append to {}: {e}", log.path().display());
            }
        }
    }
}

fn write_out(out: &mut Box<dyn Write + Send>, text: &str) {
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
        log::warn!("console write failed: {e}");
    }
}

fn timestamp() -> String {
    Local::now().format("[%H:%M:%S] ").to_string()
}
