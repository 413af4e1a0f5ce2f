//! Echo command - repeats the rest of the message.

use async_trait::async_trait;
use dispatch_engine::{Command, CommandContext, CommandHandler, CommandSpec};
use usage_resolver::UsageSpec;

pub struct EchoHandler;

#[async_trait]
impl CommandHandler for EchoHandler {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let text = ctx
            .arg("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        ctx.responder.say(&text).await?;
        Ok(())
    }
}

pub fn echo_command() -> Command {
    Command::new(
        CommandSpec::new("echo")
            .alias("say")
            .description("Repeat a message back.")
            .arg(UsageSpec::string("text").last()),
        EchoHandler,
    )
}
