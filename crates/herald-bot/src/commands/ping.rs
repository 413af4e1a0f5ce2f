//! Ping command - the liveness check everyone types first.

use async_trait::async_trait;
use dispatch_engine::{Command, CommandContext, CommandHandler, CommandSpec};
use std::time::Duration;

pub struct PingHandler;

#[async_trait]
impl CommandHandler for PingHandler {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        ctx.responder.say("Pong!").await?;
        Ok(())
    }
}

pub fn ping_command() -> Command {
    Command::new(
        CommandSpec::new("ping")
            .description("Check whether the bot is alive.")
            .cooldown(Duration::from_secs(5)),
        PingHandler,
    )
}
