//! Announce command - admin-only broadcast into the invoking channel.

use async_trait::async_trait;
use dispatch_engine::{Command, CommandContext, CommandHandler, CommandSpec};
use usage_resolver::UsageSpec;

pub struct AnnounceHandler;

#[async_trait]
impl CommandHandler for AnnounceHandler {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let text = ctx
            .arg("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        ctx.responder.say(&format!("📣 {text}")).await?;
        Ok(())
    }
}

pub fn announce_command() -> Command {
    Command::new(
        CommandSpec::new("announce")
            .description("Broadcast an announcement.")
            .group("admin")
            .admin_only()
            .guild_only()
            .arg(UsageSpec::string("text").last()),
        AnnounceHandler,
    )
}
