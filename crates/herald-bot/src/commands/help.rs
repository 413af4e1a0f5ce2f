//! Help command - lists visible commands grouped by category.

use async_trait::async_trait;
use dispatch_engine::{Command, CommandContext, CommandHandler, CommandSpec};
use std::collections::BTreeMap;
use usage_resolver::render_usage;

pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let prefix = ctx.container.settings.prefix.clone();
        let registry = ctx.registry();

        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        {
            let registry = registry.read().await;
            for command in registry.primary_commands() {
                if command.spec.hidden {
                    continue;
                }
                let usage = render_usage(&prefix, command.spec.name(), &command.spec.usage);
                let mut line = format!("  {usage}");
                if !command.spec.description.is_empty() {
                    line.push_str(&format!(" - {}", command.spec.description));
                }
                for sub in command.subcommands().values() {
                    let label = format!("{} {}", command.spec.name(), sub.spec.name());
                    let usage = render_usage(&prefix, &label, &sub.spec.usage);
                    line.push_str(&format!("\n  {usage}"));
                    if !sub.spec.description.is_empty() {
                        line.push_str(&format!(" - {}", sub.spec.description));
                    }
                }
                groups.entry(command.spec.group.clone()).or_default().push(line);
            }
        }

        let mut text = String::from("Available commands:");
        for (group, lines) in groups {
            text.push_str(&format!("\n\n{group}:\n"));
            text.push_str(&lines.join("\n"));
        }
        ctx.responder.say(&text).await?;
        Ok(())
    }
}

pub fn help_command() -> Command {
    Command::new(
        CommandSpec::new("help")
            .alias("commands")
            .description("Show this listing."),
        HelpHandler,
    )
}
