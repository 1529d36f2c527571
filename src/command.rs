use crate::console::Console;
use crate::env::Environment;
use crate::registry::Registry;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Conventional process exit code type used by this crate.
///
/// The interpreter hands one of the symbolic status codes from
/// [`Status`](crate::Status) back to the caller, which the binary passes to
/// `std::process::exit`.
pub type ExitCode = i32;

/// Value returned by [`Invocation::arg_int`] when the argument is missing or malformed.
pub const INT_SENTINEL: i64 = -1;

/// Value returned by [`Invocation::arg_str`] when the argument is missing.
pub const STR_SENTINEL: &str = "ERROR";

/// Invocable behaviour registered under a command name.
///
/// Handlers run on the worker thread, so they must be `Send + Sync`. A handler reports
/// failure by returning `Err`; the worker turns that into a console error and moves on.
pub type Handler = Arc<dyn Fn(&Invocation<'_>) -> Result<()> + Send + Sync>;

/// A named, described capability stored in the [`Registry`].
#[derive(Clone)]
pub struct Command {
    name: String,
    description: String,
    handler: Handler,
}

impl Command {
    /// Bundle a handler with the name and description it is listed under.
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            handler,
        }
    }

    /// The name the command is looked up by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description shown by `help`.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// A clone of the handler, ready to be bound into a queue item.
    pub fn handler(&self) -> Handler {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Problems a handler can hit while reading its arguments.
///
/// The `Display` text is the message body shown to the user under the error tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// `requested` is 1-based, as the user counts arguments.
    #[error("The {requested} argument was requested, but only {supplied} were introduced.")]
    OutOfRange { requested: usize, supplied: usize },
    #[error("Can't transform '{token}' to integer number.")]
    NotAnInteger { token: String },
}

/// Arguments of a single command invocation.
///
/// Every queued command owns its own snapshot, so two invocations never see each
/// other's arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments(Vec<String>);

impl Arguments {
    /// Take ownership of an already tokenized argument list.
    pub fn new(args: Vec<String>) -> Self {
        Self(args)
    }

    /// Number of arguments supplied.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the command was given no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The arguments in the order they were typed.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// All arguments joined with single spaces.
    pub fn joined(&self) -> String {
        self.0.join(" ")
    }

    /// Argument at `index` (0-based), or [`ArgumentError::OutOfRange`].
    pub fn get_str(&self, index: usize) -> Result<&str, ArgumentError> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or(ArgumentError::OutOfRange {
                requested: index + 1,
                supplied: self.0.len(),
            })
    }

    /// Argument at `index` parsed as an integer.
    pub fn get_int(&self, index: usize) -> Result<i64, ArgumentError> {
        let token = self.get_str(index)?;
        token.parse().map_err(|_| ArgumentError::NotAnInteger {
            token: token.to_string(),
        })
    }
}

impl From<Vec<String>> for Arguments {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

/// Everything a handler can see while it runs.
pub struct Invocation<'a> {
    args: &'a Arguments,
    console: &'a Console,
    env: &'a Environment,
    registry: &'a Registry,
}

impl<'a> Invocation<'a> {
    /// Gather what a single handler call needs.
    pub fn new(
        args: &'a Arguments,
        console: &'a Console,
        env: &'a Environment,
        registry: &'a Registry,
    ) -> Self {
        Self {
            args,
            console,
            env,
            registry,
        }
    }

    /// This invocation's own arguments.
    pub fn args(&self) -> &Arguments {
        self.args
    }

    /// Where the handler prints.
    pub fn console(&self) -> &Console {
        self.console
    }

    /// Session configuration.
    pub fn env(&self) -> &Environment {
        self.env
    }

    /// Every registered command, for listings.
    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Integer argument at `index`, or [`INT_SENTINEL`] after reporting exactly one error.
    pub fn arg_int(&self, index: usize) -> i64 {
        match self.args.get_int(index) {
            Ok(value) => value,
            Err(e) => {
                self.console
                    .error(&format!("{e} Returned {INT_SENTINEL}"));
                INT_SENTINEL
            }
        }
    }

    /// String argument at `index`, or [`STR_SENTINEL`] after reporting exactly one error.
    pub fn arg_str(&self, index: usize) -> String {
        match self.args.get_str(index) {
            Ok(value) => value.to_string(),
            Err(e) => {
                self.console
                    .error(&format!("{e} Returned '{STR_SENTINEL}'"));
                STR_SENTINEL.to_string()
            }
        }
    }
}
