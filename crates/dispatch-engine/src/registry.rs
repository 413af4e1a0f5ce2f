//! Trigger → command registry.

use crate::command::Command;
use crate::context::CommandContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use usage_resolver::{CommandIndex, CommandMeta, UsageError};

/// Registration faults. These abort startup or reload; a broken plugin set
/// must not run half-registered.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Command has no triggers")]
    NoTriggers,

    #[error("Duplicate trigger \"{trigger}\" (already bound to {existing})")]
    DuplicateTrigger { trigger: String, existing: String },

    #[error("Broken usage schema on {command}: {source}")]
    BrokenUsage {
        command: String,
        #[source]
        source: UsageError,
    },
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its primary name and every alias.
    ///
    /// Collisions fail before anything is inserted, so the earlier
    /// registration keeps all of its bindings.
    pub fn attach(&mut self, command: Command) -> Result<(), RegistryError> {
        if command.spec.triggers.is_empty() {
            return Err(RegistryError::NoTriggers);
        }

        validate_usage(&command)?;

        for trigger in &command.spec.triggers {
            let key = trigger.to_lowercase();
            if let Some(existing) = self.commands.get(&key) {
                return Err(RegistryError::DuplicateTrigger {
                    trigger: key,
                    existing: existing.spec.name().to_string(),
                });
            }
        }

        let command = Arc::new(command);
        for trigger in &command.spec.triggers {
            self.commands
                .insert(trigger.to_lowercase(), Arc::clone(&command));
        }
        Ok(())
    }

    /// Remove a command and all of its aliases. Returns whether anything
    /// was removed.
    pub fn eject(&mut self, trigger: &str) -> bool {
        let Some(found) = self.commands.get(&trigger.to_lowercase()).cloned() else {
            return false;
        };
        self.commands
            .retain(|_, command| !Arc::ptr_eq(command, &found));
        true
    }

    /// Remove every command in a group. Returns the number of commands
    /// removed (not bindings).
    pub fn eject_group(&mut self, group: &str) -> usize {
        let names: Vec<String> = self
            .primary_commands()
            .into_iter()
            .filter(|c| c.spec.group == group)
            .map(|c| c.spec.name().to_string())
            .collect();
        for name in &names {
            self.eject(name);
        }
        names.len()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn lookup(&self, trigger: &str) -> Option<Arc<Command>> {
        self.commands.get(&trigger.to_lowercase()).cloned()
    }

    /// Invoke a trigger directly. Unknown triggers are expected (e.g. a
    /// message raced a reload) and are a silent no-op.
    pub async fn execute(&self, trigger: &str, ctx: &CommandContext) {
        match self.lookup(trigger) {
            Some(command) => command.invoke(ctx).await,
            None => debug!(trigger, "execute on unknown trigger, ignoring"),
        }
    }

    /// Each registered command once, regardless of alias count.
    pub fn primary_commands(&self) -> Vec<Arc<Command>> {
        let mut seen = std::collections::HashSet::new();
        let mut out: Vec<Arc<Command>> = self
            .commands
            .values()
            .filter(|c| seen.insert(c.spec.name().to_string()))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.spec.name().cmp(b.spec.name()));
        out
    }

    pub fn len(&self) -> usize {
        self.primary_commands().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn validate_usage(command: &Command) -> Result<(), RegistryError> {
    let broken = |label: &str, index: usize| RegistryError::BrokenUsage {
        command: label.to_string(),
        source: UsageError::UnnamedSpec { index },
    };

    for (index, spec) in command.spec.usage.iter().enumerate() {
        if spec.name.is_empty() {
            return Err(broken(command.spec.name(), index));
        }
    }
    for sub in command.subcommands().values() {
        for (index, spec) in sub.spec.usage.iter().enumerate() {
            if spec.name.is_empty() {
                return Err(broken(sub.spec.name(), index));
            }
        }
    }
    Ok(())
}

/// Async view of the registry for the resolver's `command` argument type.
pub struct RegistryIndex {
    registry: Arc<RwLock<CommandRegistry>>,
}

impl RegistryIndex {
    pub fn new(registry: Arc<RwLock<CommandRegistry>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl CommandIndex for RegistryIndex {
    async fn command_meta(&self, trigger: &str) -> Option<CommandMeta> {
        self.registry
            .read()
            .await
            .lookup(trigger)
            .map(|command| CommandMeta {
                name: command.spec.name().to_string(),
                admin_only: command.spec.admin_only,
            })
    }
}
