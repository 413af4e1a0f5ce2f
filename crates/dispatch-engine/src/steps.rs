//! Built-in middleware steps.
//!
//! A working pipeline is usually: bot filter, ignore lists, settings fetch,
//! prefix parser, ignored commands, in that priority order. All of them
//! are ordinary [`Middleware`] values; bots can interleave their own steps
//! anywhere.

use crate::container::Container;
use crate::middleware::Middleware;
use chat_platform::SettingsProvider;
use std::collections::HashSet;
use std::sync::Arc;
use usage_resolver::tokenize;

/// Drop events authored by bot accounts.
pub fn bot_filter(priority: i32) -> Middleware {
    Middleware::new("bot-filter", priority, |container: Container| async move {
        if container.event.author.is_bot {
            return Ok(None);
        }
        Ok(Some(container))
    })
}

/// Drop events from ignored users or channels.
pub fn ignore_filter(
    priority: i32,
    users: HashSet<String>,
    channels: HashSet<String>,
) -> Middleware {
    let users = Arc::new(users);
    let channels = Arc::new(channels);
    Middleware::new("ignore-filter", priority, move |container: Container| {
        let users = Arc::clone(&users);
        let channels = Arc::clone(&channels);
        async move {
            if users.contains(&container.event.author.id)
                || channels.contains(&container.event.channel.id)
            {
                return Ok(None);
            }
            Ok(Some(container))
        }
    })
}

/// Populate the container with the channel's settings.
pub fn settings_step(priority: i32, provider: Arc<dyn SettingsProvider>) -> Middleware {
    Middleware::new("settings", priority, move |mut container: Container| {
        let provider = Arc::clone(&provider);
        async move {
            container.settings = provider.get(&container.event.channel).await;
            Ok(Some(container))
        }
    })
}

/// Extract the trigger and raw argument tokens from prefixed content.
///
/// Content without a known prefix passes through untouched; the chain drops
/// trigger-less containers at the end, so ordinary conversation costs
/// nothing.
pub fn prefix_parser(priority: i32) -> Middleware {
    Middleware::new("parser", priority, |mut container: Container| async move {
        let content = container.event.content.trim().to_string();

        let stripped = content
            .strip_prefix(&container.settings.prefix)
            .or_else(|| {
                container
                    .settings
                    .admin_prefix
                    .as_deref()
                    .and_then(|admin| content.strip_prefix(admin))
            })
            .map(str::to_string);

        if let Some(rest) = stripped {
            let mut tokens = tokenize(&rest);
            if !tokens.is_empty() {
                let trigger = tokens.remove(0);
                container.set_trigger(trigger)?;
                container.raw_args = tokens;
            }
        }
        Ok(Some(container))
    })
}

/// Drop events whose parsed trigger is on the ignore list. Runs after the
/// parser.
pub fn ignored_commands(priority: i32, commands: HashSet<String>) -> Middleware {
    let commands = Arc::new(commands);
    Middleware::new("ignored-commands", priority, move |container: Container| {
        let commands = Arc::clone(&commands);
        async move {
            if let Some(trigger) = container.trigger() {
                if commands.contains(trigger) {
                    return Ok(None);
                }
            }
            Ok(Some(container))
        }
    })
}
