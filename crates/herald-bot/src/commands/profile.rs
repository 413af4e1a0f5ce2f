//! Profile command - a multi-step dialog collecting name and age.

use async_trait::async_trait;
use dispatch_engine::{
    Command, CommandContext, CommandHandler, CommandSpec, DialogError, DialogStep,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use usage_resolver::UsageSpec;

/// Stored profiles, process lifetime.
#[derive(Default, Clone)]
pub struct ProfileStore {
    profiles: Arc<RwLock<HashMap<String, (String, i64)>>>,
}

pub struct ProfileHandler {
    store: ProfileStore,
}

#[async_trait]
impl CommandHandler for ProfileHandler {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let steps = [
            DialogStep::new(
                "What should I call you? (type \"cancel\" to exit)",
                vec![{
                    let mut spec = UsageSpec::string("name");
                    spec.min = Some(2);
                    spec.max = Some(32);
                    spec
                }],
            ),
            DialogStep::new("How old are you?", vec![UsageSpec::int("age").bounds(13, 120)]),
        ];

        match ctx.dialog(&steps).await {
            Ok(answers) => {
                let name = answers["name"].as_str().unwrap_or_default().to_string();
                let age = answers["age"].as_int().unwrap_or_default();
                self.store
                    .profiles
                    .write()
                    .await
                    .insert(ctx.container.event.author.id.clone(), (name.clone(), age));
                ctx.responder
                    .say(&format!("Saved your profile: {name}, {age}."))
                    .await?;
            }
            Err(DialogError::Cancelled) => {
                ctx.responder.notice("dialog.cancelled", &[]).await?;
            }
            Err(DialogError::Timeout) => {
                ctx.responder.notice("dialog.timeout", &[]).await?;
            }
            Err(DialogError::Exhausted) => {
                ctx.responder.notice("dialog.exhausted", &[]).await?;
            }
            Err(DialogError::Platform(e)) => return Err(e.into()),
        }
        Ok(())
    }
}

pub fn profile_command() -> Command {
    Command::new(
        CommandSpec::new("profile")
            .description("Set up your profile through a short dialog.")
            .group("social"),
        ProfileHandler {
            store: ProfileStore::default(),
        },
    )
}
