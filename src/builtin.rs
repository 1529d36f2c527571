use crate::command::Invocation;
use crate::registry::{Registry, RegistryError};
use anyhow::{Context, Result};
use std::process::{Command as Process, ExitStatus};

/// Escape sequence that clears the terminal and homes the cursor, followed by the prompt.
const CLEAR_SCREEN: &str = "\u{1b}[2J\u{1b}[1;1H>";

impl Registry {
    /// A registry holding the built-in commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        // Names are literals, so registration can only fail on an empty one.
        if let Err(e) = register_builtins(&mut registry) {
            log::error!("built-in registration failed: {e}");
        }
        registry
    }
}

/// Register `pwd`, `exit`, `version`, `help`, `clear` and `exec`, in that order.
pub fn register_builtins(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register("pwd", "Print current directory", pwd)?;
    registry.register("exit", "Exit from program", exit)?;
    registry.register("version", "Print current version of program", version)?;
    registry.register("help", "Print this list of all available commands", help)?;
    registry.register("clear", "Clear terminal", clear)?;
    registry.register(
        "exec",
        "Execute typed command by system shell. EXAMPLE: \"exec ls\"",
        exec,
    )?;
    Ok(())
}

fn pwd(inv: &Invocation<'_>) -> Result<()> {
    inv.console()
        .print(&inv.env().current_dir.to_string_lossy());
    Ok(())
}

/// The controller ends the session when it sees `exit`; by the time the worker gets
/// here there is nothing left to do.
fn exit(_inv: &Invocation<'_>) -> Result<()> {
    log::debug!("exit reached the worker");
    Ok(())
}

fn version(inv: &Invocation<'_>) -> Result<()> {
    inv.console()
        .print(&format!("Current version of iNTER is {}", inv.env().version));
    Ok(())
}

fn help(inv: &Invocation<'_>) -> Result<()> {
    inv.console().print(&inv.registry().help_listing());
    Ok(())
}

fn clear(inv: &Invocation<'_>) -> Result<()> {
    inv.console().raw(CLEAR_SCREEN);
    Ok(())
}

fn exec(inv: &Invocation<'_>) -> Result<()> {
    if inv.args().is_empty() {
        inv.console().error("No parameters were provided");
        return Ok(());
    }
    let line = inv.args().joined();
    let status = run_in_shell(&line, inv)
        .with_context(|| format!("exec: can't run '{line}'"))?;
    if !status.success() {
        inv.console()
            .warning(&format!("'{line}' finished with {status}"));
    }
    inv.console().prompt();
    Ok(())
}

fn run_in_shell(line: &str, inv: &Invocation<'_>) -> std::io::Result<ExitStatus> {
    let (shell, flag) = if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };
    Process::new(shell)
        .arg(flag)
        .arg(line)
        .current_dir(&inv.env().current_dir)
        .status()
}
