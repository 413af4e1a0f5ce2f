//! Command descriptors.
//!
//! A command is data (triggers, usage schema, option flags) plus a handler
//! capability. Options compose on the flat descriptor instead of through
//! inheritance layers; sub-commands are full commands nested under a parent.

use crate::context::CommandContext;
use crate::cooldown::CooldownLedger;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use usage_resolver::UsageSpec;

/// Everything about a command except its behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    /// First entry is the primary name; the rest are aliases.
    pub triggers: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_group")]
    pub group: String,
    /// Zero disables rate limiting.
    #[serde(default, with = "humantime_serde")]
    pub cooldown: Duration,
    #[serde(default)]
    pub guild_only: bool,
    #[serde(default)]
    pub admin_only: bool,
    /// Hidden commands are skipped by help listings but stay invocable.
    #[serde(default)]
    pub hidden: bool,
    /// Channel permissions the invoker must hold.
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub usage: Vec<UsageSpec>,
    /// Sub-command to route to when the first token names none.
    #[serde(default)]
    pub subcommand: Option<String>,
}

fn default_group() -> String {
    "general".into()
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            triggers: vec![name.into().to_lowercase()],
            description: String::new(),
            group: default_group(),
            cooldown: Duration::ZERO,
            guild_only: false,
            admin_only: false,
            hidden: false,
            permissions: Vec::new(),
            usage: Vec::new(),
            subcommand: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.triggers[0]
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.triggers.push(alias.into().to_lowercase());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn arg(mut self, spec: UsageSpec) -> Self {
        self.usage.push(spec);
        self
    }

    pub fn route_to(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into().to_lowercase());
        self
    }
}

/// Command behavior. Implementations are arbitrary bot code; failures are
/// caught at the dispatch boundary.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()>;
}

/// Handler that replies with a fixed line. Doubles as the cheapest possible
/// handler for tests.
pub struct ReplyHandler(pub String);

#[async_trait]
impl CommandHandler for ReplyHandler {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        ctx.responder.say(&self.0).await?;
        Ok(())
    }
}

/// Handler that does nothing.
pub struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    async fn run(&self, _ctx: &CommandContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A registered command: spec, handler, cooldown ledger, sub-commands.
pub struct Command {
    pub spec: CommandSpec,
    pub(crate) handler: Arc<dyn CommandHandler>,
    pub(crate) subcommands: HashMap<String, Arc<Command>>,
    pub(crate) cooldowns: CooldownLedger,
}

impl Command {
    pub fn new(spec: CommandSpec, handler: impl CommandHandler + 'static) -> Self {
        Self {
            spec,
            handler: Arc::new(handler),
            subcommands: HashMap::new(),
            cooldowns: CooldownLedger::new(),
        }
    }

    /// Nest a sub-command under this command's primary name.
    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands
            .insert(command.spec.name().to_string(), Arc::new(command));
        self
    }

    pub fn subcommands(&self) -> &HashMap<String, Arc<Command>> {
        &self.subcommands
    }

    /// Run the handler, containing any fault at this boundary.
    pub async fn invoke(&self, ctx: &CommandContext) {
        if let Err(fault) = self.handler.run(ctx).await {
            error!(
                command = %ctx.label,
                invoker = %ctx.container.event.author.id,
                error = %fault,
                "command handler failed"
            );
        }
    }
}
