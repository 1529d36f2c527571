use std::env as stdenv;
use std::path::PathBuf;

/// Environment variable that overrides the session log location.
pub const LOG_PATH_VAR: &str = "INTER_LOG";

/// Log file used when nothing else is configured, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "Log.txt";

/// Session configuration visible to command handlers.
///
/// - `current_dir`: the directory `pwd` reports and `exec` runs in.
/// - `log_path`: where the session log is appended; `None` disables the log. A
///   [`Session`](crate::Session) hands this to its console, overriding the console's own.
/// - `version`: the version string printed by `version`.
#[derive(Debug, Clone)]
pub struct Environment {
    pub current_dir: PathBuf,
    pub log_path: Option<PathBuf>,
    pub version: String,
}

impl Environment {
    /// Capture the current process state.
    ///
    /// `current_dir` comes from `std::env::current_dir()`, the log path from
    /// [`LOG_PATH_VAR`] falling back to [`DEFAULT_LOG_FILE`].
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let log_path = stdenv::var_os(LOG_PATH_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        Self {
            current_dir,
            log_path: Some(log_path),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Replace the log location; `None` disables the session log.
    pub fn with_log_path(mut self, log_path: Option<PathBuf>) -> Self {
        self.log_path = log_path;
        self
    }

    /// Replace the directory `pwd` reports and `exec` runs in.
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = dir.into();
        self
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
