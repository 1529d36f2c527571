//! iNTER: a small line-oriented command interpreter.
//!
//! Lines come from a terminal or a script file. Each line is split into
//! semicolon-separated commands, every command name is looked up in a [`Registry`],
//! and the matching handlers are queued for a single background worker that runs them
//! strictly in order. Parsing and dispatch never wait for execution, so the prompt stays
//! responsive while earlier commands are still running.
//!
//! The main entry point is [`Session`]. The public modules [`command`] and [`source`]
//! expose the types needed to register your own commands and feed your own input.

mod builtin;
pub mod command;
mod console;
pub mod env;
mod io_adapters;
pub mod parser;
mod queue;
mod registry;
mod session;
pub mod source;
mod worker;

pub use builtin::register_builtins;
pub use command::{ExitCode, Invocation};
pub use console::{Console, LogFile, Tag};
pub use env::Environment;
pub use io_adapters::SharedBuffer;
pub use registry::{Registry, RegistryError};
pub use session::{
    EXIT_CODE, EXIT_COMMAND, INIT_CODE, RUNTIME_CODE, SCRIPT_DIRECTIVE, ScriptError, Session,
    Status,
};
