use crate::command::{Arguments, ExitCode};
use crate::console::Console;
use crate::env::Environment;
use crate::parser::{ParsedCommand, parse_line};
use crate::queue::{ExecutionQueue, QueueItem};
use crate::registry::Registry;
use crate::source::{LineSource, LineSourceError, ReaderSource};
use crate::worker::Worker;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// First line every script must start with.
pub const SCRIPT_DIRECTIVE: &str = "#iNTER";

/// Command name that ends the session.
pub const EXIT_COMMAND: &str = "exit";

/// Status code while the session is being set up.
pub const INIT_CODE: ExitCode = -1;
/// Status code while the interpreter loop runs.
pub const RUNTIME_CODE: ExitCode = 1;
/// Status code handed back once the session has shut down.
pub const EXIT_CODE: ExitCode = 0;

/// Lifecycle of a session. Moves strictly forward: `Init -> Running -> Terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Init,
    Running,
    Terminal,
}

impl Status {
    /// Symbolic status code for this stage.
    pub fn code(self) -> ExitCode {
        match self {
            Status::Init => INIT_CODE,
            Status::Running => RUNTIME_CODE,
            Status::Terminal => EXIT_CODE,
        }
    }
}

/// Script could not be run. Both cases are reported on the console before returning.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Unable to open file of script")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Missing '#iNTER' directive in beginning of script")]
    MissingDirective { path: PathBuf },
}

/// State the controller and the worker both read.
pub(crate) struct Shared {
    pub(crate) registry: Registry,
    pub(crate) console: Console,
    pub(crate) env: Environment,
}

/// The session controller: reads lines, parses them, and dispatches the commands to
/// the worker through the execution queue.
///
/// A session runs once. [`Session::interpret`] and [`Session::execute_script`] consume
/// it and only return after the worker has finished everything that was queued.
///
/// Example
/// ```
/// use inter::{Console, Environment, Registry, Session, SharedBuffer, EXIT_CODE};
/// use inter::source::ReaderSource;
///
/// let out = SharedBuffer::new();
/// let console = Console::new(Box::new(out.clone()));
/// let env = Environment::new().with_log_path(None);
/// let session = Session::new(Registry::with_builtins(), env, console);
///
/// let mut input = ReaderSource::new("version\nexit\n".as_bytes());
/// assert_eq!(session.interpret(&mut input), EXIT_CODE);
/// assert!(out.contents().contains("Current version of iNTER is"));
/// ```
pub struct Session {
    shared: Arc<Shared>,
    queue: Arc<ExecutionQueue>,
}

impl Session {
    /// Build a session around `registry`.
    ///
    /// The session log is taken from `env.log_path` and replaces any log file the
    /// console was built with; `None` turns logging off.
    pub fn new(registry: Registry, env: Environment, console: Console) -> Self {
        let console = console.with_log_file(env.log_path.clone());
        console.system("Initialize iNTER...");
        Self {
            shared: Arc::new(Shared {
                registry,
                console,
                env,
            }),
            queue: Arc::new(ExecutionQueue::new()),
        }
    }

    /// Current lifecycle stage.
    pub fn status(&self) -> Status {
        self.queue.status()
    }

    /// The print path shared with the worker.
    pub fn console(&self) -> &Console {
        &self.shared.console
    }

    /// Run the interpreter loop over `source` until `exit` or the end of input.
    pub fn interpret(self, source: &mut dyn LineSource) -> ExitCode {
        if !self.queue.start() {
            log::warn!("session already ran; refusing to start it again");
            return self.status().code();
        }
        let worker = match Worker::spawn(Arc::clone(&self.queue), Arc::clone(&self.shared)) {
            Ok(worker) => worker,
            Err(e) => {
                log::error!("can't start the worker thread: {e}");
                self.console().error("Unable to start the command executor");
                self.queue.shutdown();
                return self.status().code();
            }
        };

        loop {
            let line = match source.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(LineSourceError::Interrupted) => {
                    self.console().log("[2] Terminated by user pressing CTRL+C");
                    break;
                }
                Err(e) => {
                    log::error!("{e}");
                    self.console().error(&e.to_string());
                    break;
                }
            };
            self.console().log_input(&line);
            self.console().prompt();

            let commands = parse_line(&line);
            for (position, command) in commands.iter().enumerate() {
                let queued = self.dispatch(command);
                if command.name == EXIT_COMMAND {
                    if position + 1 < commands.len() {
                        self.console()
                            .warning("More commands were entered, but exit command was executed.");
                    }
                    let pending = self.queue.len().saturating_sub(usize::from(queued));
                    if pending > 0 {
                        self.console()
                            .system("Waiting for the execution of the remaining commands...");
                    }
                    return self.finish(worker, "Exiting...");
                }
            }
        }

        self.dispatch(&ParsedCommand::new(EXIT_COMMAND, Vec::new()));
        self.finish(worker, "Script successfully executed.")
    }

    /// Run a script file. The first line must be exactly [`SCRIPT_DIRECTIVE`].
    pub fn execute_script(self, path: impl AsRef<Path>) -> Result<ExitCode, ScriptError> {
        let path = path.as_ref();
        self.console()
            .system(&format!("'{}' script execution begins", path.display()));

        let mut source = match open_script(path) {
            Ok(source) => source,
            Err(e) => {
                log::error!("{e}: {}", path.display());
                self.console().error(&e.to_string());
                return Err(e);
            }
        };
        Ok(self.interpret(&mut source))
    }

    /// Queue `command` if it is registered. Returns whether anything was queued.
    pub(crate) fn dispatch(&self, command: &ParsedCommand) -> bool {
        let Some(found) = self.shared.registry.lookup(&command.name) else {
            self.console().system(&format!(
                "Command '{}' is not found. Type 'help' to see a list of available commands.",
                command.name
            ));
            return false;
        };
        let item = QueueItem::new(
            found.name(),
            found.handler(),
            Arguments::new(command.arguments.clone()),
        );
        match self.queue.push(item) {
            Ok(()) => {
                log::debug!("queued '{}', depth {}", command.name, self.queue.len());
                true
            }
            Err(e) => {
                log::warn!("'{}' dropped: {e}", command.name);
                false
            }
        }
    }

    fn finish(&self, worker: Worker, notice: &str) -> ExitCode {
        self.queue.shutdown();
        worker.join();
        self.console().system(notice);
        let code = self.status().code();
        self.console()
            .log(&format!("Program exited with code {code}"));
        log::info!("session finished with code {code}");
        code
    }
}

fn open_script(path: &Path) -> Result<ReaderSource<BufReader<File>>, ScriptError> {
    let file = File::open(path).map_err(|source| ScriptError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut source = ReaderSource::new(BufReader::new(file));
    let first = source.next_line().map_err(|e| ScriptError::Open {
        path: path.to_path_buf(),
        source: match e {
            LineSourceError::Io(io) => io,
            other => io::Error::other(other.to_string()),
        },
    })?;
    if first.as_deref() != Some(SCRIPT_DIRECTIVE) {
        return Err(ScriptError::MissingDirective {
            path: path.to_path_buf(),
        });
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SharedBuffer;
    use crate::command::Invocation;
    use std::fs;
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<(String, Vec<String>)>>>;

    /// Registry whose commands only record that they ran.
    fn recording_registry(names: &[&str]) -> (Registry, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();
        for &name in names {
            let calls = Arc::clone(&calls);
            let owned = name.to_string();
            registry
                .register(name, "records itself", move |inv: &Invocation<'_>| {
                    calls
                        .lock()
                        .unwrap()
                        .push((owned.clone(), inv.args().as_slice().to_vec()));
                    Ok(())
                })
                .unwrap();
        }
        (registry, calls)
    }

    fn session(registry: Registry, buf: &SharedBuffer) -> Session {
        let console = Console::new(Box::new(buf.clone()));
        Session::new(registry, Environment::new().with_log_path(None), console)
    }

    fn run(session: Session, input: &str) -> ExitCode {
        session.interpret(&mut ReaderSource::new(input.as_bytes()))
    }

    fn names(calls: &Calls) -> Vec<String> {
        calls.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::Init.code(), INIT_CODE);
        assert_eq!(Status::Running.code(), RUNTIME_CODE);
        assert_eq!(Status::Terminal.code(), EXIT_CODE);
    }

    #[test]
    fn test_unknown_command_is_not_queued() {
        let buf = SharedBuffer::new();
        let (registry, _) = recording_registry(&["pwd"]);
        let s = session(registry, &buf);

        assert!(!s.dispatch(&ParsedCommand::new("nope", Vec::new())));
        assert_eq!(s.queue.len(), 0);
        assert!(buf
            .contents()
            .contains("[SYSTEM} Command 'nope' is not found."));
    }

    #[test]
    fn test_known_command_is_queued_with_arguments() {
        let buf = SharedBuffer::new();
        let (registry, _) = recording_registry(&["pwd"]);
        let s = session(registry, &buf);

        assert!(s.dispatch(&ParsedCommand::new("pwd", vec!["a".to_string()])));
        assert_eq!(s.queue.len(), 1);
        let item = s.queue.pop().unwrap();
        assert_eq!(item.name(), "pwd");
        assert_eq!(item.arguments().as_slice(), ["a".to_string()]);
    }

    #[test]
    fn test_exit_runs_everything_queued_before_it() {
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["a", "b", "exit"]);
        let s = session(registry, &buf);

        let code = run(s, "a 1;b 2 3\nexit\na\n");

        assert_eq!(code, EXIT_CODE);
        assert_eq!(names(&calls), vec!["a", "b", "exit"]);
        assert_eq!(calls.lock().unwrap()[1].1, vec!["2", "3"]);
        assert!(buf.contents().contains("[SYSTEM} Exiting..."));
    }

    #[test]
    fn test_exit_stops_the_rest_of_the_line() {
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["a", "exit"]);
        let s = session(registry, &buf);

        run(s, "a;exit;a\n");

        assert_eq!(names(&calls), vec!["a", "exit"]);
        assert!(buf
            .contents()
            .contains("[WARNING} More commands were entered, but exit command was executed."));
    }

    #[test]
    fn test_exhausted_input_synthesizes_exit() {
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["a", "exit"]);
        let s = session(registry, &buf);

        let code = run(s, "a\n# comment\n\na\n");

        assert_eq!(code, EXIT_CODE);
        assert_eq!(names(&calls), vec!["a", "a", "exit"]);
        assert!(buf.contents().contains("[SYSTEM} Script successfully executed."));
    }

    #[test]
    fn test_exit_without_registration_still_ends_session() {
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["a"]);
        let s = session(registry, &buf);

        let code = run(s, "a\nexit\na\n");

        assert_eq!(code, EXIT_CODE);
        assert_eq!(names(&calls), vec!["a"]);
    }

    #[test]
    fn test_arguments_are_scoped_per_invocation() {
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["a", "exit"]);
        let s = session(registry, &buf);

        run(s, "a one;a;a two three\n");

        let args: Vec<Vec<String>> = calls.lock().unwrap().iter().map(|(_, a)| a.clone()).collect();
        assert_eq!(
            args,
            vec![
                vec!["one".to_string()],
                vec![],
                vec!["two".to_string(), "three".to_string()],
                vec![],
            ]
        );
    }

    #[test]
    fn test_session_log_records_input_and_exit() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("Log.txt");
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["pwd", "exit"]);
        let console = Console::new(Box::new(buf.clone()));
        let env = Environment::new().with_log_path(Some(log_path.clone()));
        let s = Session::new(registry, env, console);

        let code = run(s, "pwd;\nexit;\n");

        assert_eq!(code, EXIT_CODE);
        assert_eq!(names(&calls), vec!["pwd", "exit"]);
        let log = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert!(lines.contains(&">pwd;"));
        assert!(lines.contains(&">exit;"));
        assert_eq!(lines.last(), Some(&"Program exited with code 0"));
    }

    #[test]
    fn test_script_without_directive_dispatches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("bad.inter");
        fs::write(&script, "pwd\nexit\n").unwrap();
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["pwd", "exit"]);
        let s = session(registry, &buf);

        let err = s.execute_script(&script).unwrap_err();

        assert!(matches!(err, ScriptError::MissingDirective { .. }));
        assert!(calls.lock().unwrap().is_empty());
        assert!(buf
            .contents()
            .contains("[ERROR} Missing '#iNTER' directive in beginning of script"));
    }

    #[test]
    fn test_missing_script_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["exit"]);
        let s = session(registry, &buf);

        let err = s.execute_script(dir.path().join("absent.inter")).unwrap_err();

        assert!(matches!(err, ScriptError::Open { .. }));
        assert!(calls.lock().unwrap().is_empty());
        assert!(buf.contents().contains("[ERROR} Unable to open file of script"));
    }

    #[test]
    fn test_valid_script_runs() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ok.inter");
        fs::write(&script, "#iNTER\na 1 # first\n\na 2;exit\na 3\n").unwrap();
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["a", "exit"]);
        let s = session(registry, &buf);

        assert_eq!(s.execute_script(&script).unwrap(), EXIT_CODE);
        let args: Vec<Vec<String>> = calls.lock().unwrap().iter().map(|(_, a)| a.clone()).collect();
        assert_eq!(args, vec![vec!["1".to_string()], vec!["2".to_string()], vec![]]);
    }

    /// Hands out its lines, then the given error.
    struct FailingSource {
        lines: Vec<&'static str>,
        error: Option<LineSourceError>,
    }

    impl LineSource for FailingSource {
        fn next_line(&mut self) -> Result<Option<String>, LineSourceError> {
            if !self.lines.is_empty() {
                return Ok(Some(self.lines.remove(0).to_string()));
            }
            match self.error.take() {
                Some(e) => Err(e),
                None => Ok(None),
            }
        }
    }

    fn logged_session(registry: Registry, buf: &SharedBuffer, log_path: &Path) -> Session {
        let env = Environment::new().with_log_path(Some(log_path.to_path_buf()));
        Session::new(registry, env, Console::new(Box::new(buf.clone())))
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_session() {
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["a"]);
        let s = session(registry, &buf);

        let input: &[u8] = b"a 1\na 2 # caf\xe9\na 3\n";
        let code = s.interpret(&mut ReaderSource::new(input));

        assert_eq!(code, EXIT_CODE);
        let args: Vec<Vec<String>> = calls.lock().unwrap().iter().map(|(_, a)| a.clone()).collect();
        assert_eq!(args, vec![vec!["1".to_string()], vec!["2".to_string()], vec!["3".to_string()]]);
        assert!(!buf.contents().contains("[ERROR}"));
    }

    #[test]
    fn test_interrupt_logs_and_drains() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("Log.txt");
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["a", "exit"]);
        let s = logged_session(registry, &buf, &log_path);

        let mut source = FailingSource {
            lines: vec!["a 1"],
            error: Some(LineSourceError::Interrupted),
        };
        let code = s.interpret(&mut source);

        assert_eq!(code, EXIT_CODE);
        assert_eq!(names(&calls), vec!["a", "exit"]);
        let log = fs::read_to_string(&log_path).unwrap();
        assert!(log.lines().any(|l| l == "[2] Terminated by user pressing CTRL+C"));
        assert_eq!(log.lines().last(), Some("Program exited with code 0"));
    }

    #[test]
    fn test_read_error_is_reported_and_drains() {
        let buf = SharedBuffer::new();
        let (registry, calls) = recording_registry(&["a", "exit"]);
        let s = session(registry, &buf);

        let mut source = FailingSource {
            lines: vec!["a 1"],
            error: Some(LineSourceError::Io(io::Error::other("disk gone"))),
        };
        let code = s.interpret(&mut source);

        assert_eq!(code, EXIT_CODE);
        assert_eq!(names(&calls), vec!["a", "exit"]);
        assert!(buf.contents().contains("[ERROR} can't read input: disk gone"));
    }

    #[test]
    fn test_log_location_comes_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("Log.txt");
        let buf = SharedBuffer::new();
        let (registry, _) = recording_registry(&["exit"]);
        let s = logged_session(registry, &buf, &log_path);

        run(s, "exit\n");

        let log = fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("[SYSTEM} Initialize iNTER..."));
        assert!(log.lines().any(|l| l == ">exit"));
    }

    #[test]
    fn test_environment_without_log_disables_console_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("Log.txt");
        let buf = SharedBuffer::new();
        let (registry, _) = recording_registry(&["exit"]);
        let console = Console::new(Box::new(buf.clone())).with_log_file(Some(log_path.clone()));
        let s = Session::new(registry, Environment::new().with_log_path(None), console);

        assert!(s.console().log_file().is_none());
        run(s, "exit\n");

        assert!(!log_path.exists());
    }
}
