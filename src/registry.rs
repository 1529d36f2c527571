use crate::command::{Command, Invocation};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Width of a terminal tab stop, used to align the help listing.
const TAB_WIDTH: usize = 8;

/// Why a registration was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command name must not be empty")]
    EmptyName,
}

/// Mapping from command name to [`Command`], in registration order.
///
/// Filled once at startup and read-only afterwards; the session shares it with the
/// worker behind an `Arc`.
#[derive(Clone, Default)]
pub struct Registry {
    commands: Vec<Command>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handler` under `name`. Re-registering a name replaces the entry in place.
    pub fn register<F>(
        &mut self,
        name: &str,
        description: &str,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&Invocation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let command = Command::new(name, description, Arc::new(handler));
        match self.index.get(name) {
            Some(&slot) => {
                log::debug!("replacing command '{name}'");
                self.commands[slot] = command;
            }
            None => {
                self.index.insert(name.to_string(), self.commands.len());
                self.commands.push(command);
            }
        }
        Ok(())
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.index.get(name).map(|&slot| &self.commands[slot])
    }

    /// `(name, description)` pairs in registration order.
    pub fn list(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands.iter().map(|c| (c.name(), c.description()))
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// One line per command, names padded with tabs so the descriptions line up on the
    /// first tab stop past the longest name.
    pub fn help_listing(&self) -> String {
        let widest = self.list().map(|(name, _)| name.len()).max().unwrap_or(0);
        let mut listing = String::from("List of available commands:");
        for (name, description) in self.list() {
            let tabs = widest / TAB_WIDTH - name.len() / TAB_WIDTH + 1;
            listing.push('\n');
            listing.push_str(name);
            listing.push_str(&"\t".repeat(tabs));
            listing.push_str(description);
        }
        listing
    }
}
