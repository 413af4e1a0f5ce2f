//! Herald demo bot - console entry point.

use anyhow::Context;
use herald_bot::commands::*;
use herald_bot::config::{csv_set, Config};
use herald_bot::console;
use herald_bot::error::AppResult;
use chat_platform::{
    ChannelSettings, InMemoryDirectory, InMemorySettings, Localizer, Member, StaticPermissions,
};
use dispatch_engine::{steps, DialogPolicy, Engine, EngineOptions};
use std::sync::Arc;
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting herald console bot...");

    // Platform collaborators, all in-memory for the console deployment
    let settings = Arc::new(InMemorySettings::new(ChannelSettings {
        prefix: config.bot.prefix.clone(),
        admin_prefix: config.bot.admin_prefix.clone(),
        lang: config.bot.lang.clone(),
    }));
    let directory = Arc::new(InMemoryDirectory::new());
    directory
        .add_channel(console::CONSOLE_CHANNEL, console::console_channel())
        .await;
    directory
        .add_member(
            console::CONSOLE_CHANNEL,
            Member {
                id: console::OPERATOR_ID.into(),
                name: "operator".into(),
                nickname: None,
            },
        )
        .await;

    let engine = Arc::new(Engine::new(
        Arc::new(console::ConsoleOutbound),
        directory,
        Arc::new(StaticPermissions::new()),
        Arc::new(Localizer::with_defaults()),
        EngineOptions {
            admins: csv_set(&config.bot.admins),
            max_message_len: config.bot.max_message_len,
            dialog: DialogPolicy {
                timeout: config.dialog.timeout,
                tries: config.dialog.tries,
                cancel_keyword: config.dialog.cancel_keyword.clone(),
            },
        },
    ));

    // Middleware chain, ascending priority
    engine.register_middleware(steps::bot_filter(10)).await;
    engine
        .register_middleware(steps::ignore_filter(
            20,
            csv_set(&config.ignore.users),
            csv_set(&config.ignore.channels),
        ))
        .await;
    engine
        .register_middleware(steps::settings_step(30, settings))
        .await;
    engine.register_middleware(steps::prefix_parser(40)).await;
    engine
        .register_middleware(steps::ignored_commands(
            50,
            csv_set(&config.ignore.commands),
        ))
        .await;

    // Command set. A duplicate trigger here is a broken deployment and
    // aborts startup.
    let ledger = CreditsLedger::new();
    engine.attach(ping_command()).await?;
    engine.attach(dice_command()).await?;
    engine.attach(echo_command()).await?;
    engine.attach(credits_command(ledger)).await?;
    engine.attach(profile_command()).await?;
    engine.attach(announce_command()).await?;
    engine.attach(help_command()).await?;

    info!(
        "Registered {} commands, prefix {:?}",
        engine.registry().read().await.len(),
        config.bot.prefix
    );
    info!("Type {}help to get started, Ctrl-C to exit", config.bot.prefix);

    let mut stream = Box::pin(console::event_stream());

    // Main event loop. Each event gets its own task so a handler suspended
    // in a dialog never blocks the next message.
    loop {
        tokio::select! {
            Some(event) = stream.next() => {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    if let Err(e) = engine.handle(event).await {
                        error!("Failed to process event: {}", e);
                    }
                });
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
