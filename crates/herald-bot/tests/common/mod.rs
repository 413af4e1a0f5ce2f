//! Shared harness for the end-to-end tests: a fully wired engine with a
//! recording outbound in place of a real platform connection.

use chat_platform::{
    Author, Channel, ChannelSettings, ChatEvent, InMemoryDirectory, InMemorySettings, Localizer,
    RecordingOutbound, StaticPermissions,
};
use dispatch_engine::{steps, DialogPolicy, Engine, EngineOptions};
use herald_bot::commands::*;
use std::sync::Arc;
use std::time::Duration;

pub struct TestBot {
    pub engine: Arc<Engine>,
    pub outbound: Arc<RecordingOutbound>,
}

pub async fn test_bot() -> TestBot {
    test_bot_with_dialog(DialogPolicy::default()).await
}

pub async fn test_bot_with_dialog(dialog: DialogPolicy) -> TestBot {
    let outbound = RecordingOutbound::new();
    let engine = Engine::new(
        outbound.clone(),
        Arc::new(InMemoryDirectory::new()),
        Arc::new(StaticPermissions::new()),
        Arc::new(Localizer::with_defaults()),
        EngineOptions {
            admins: ["admin".to_string()].into_iter().collect(),
            max_message_len: 2000,
            dialog,
        },
    );

    engine.register_middleware(steps::bot_filter(10)).await;
    engine
        .register_middleware(steps::settings_step(
            30,
            Arc::new(InMemorySettings::new(ChannelSettings::default())),
        ))
        .await;
    engine.register_middleware(steps::prefix_parser(40)).await;

    let ledger = CreditsLedger::new();
    engine.attach(ping_command()).await.unwrap();
    engine.attach(dice_command()).await.unwrap();
    engine.attach(echo_command()).await.unwrap();
    engine.attach(credits_command(ledger)).await.unwrap();
    engine.attach(profile_command()).await.unwrap();
    engine.attach(announce_command()).await.unwrap();
    engine.attach(help_command()).await.unwrap();

    TestBot {
        engine: Arc::new(engine),
        outbound,
    }
}

pub fn guild_event(user: &str, content: &str) -> ChatEvent {
    ChatEvent::new(
        Author {
            id: user.into(),
            name: user.into(),
            is_bot: false,
        },
        Channel {
            id: "c1".into(),
            name: "general".into(),
            guild_id: Some("g1".into()),
        },
        content,
    )
}

pub fn dm_event(user: &str, content: &str) -> ChatEvent {
    ChatEvent::new(
        Author {
            id: user.into(),
            name: user.into(),
            is_bot: false,
        },
        Channel {
            id: format!("dm-{user}"),
            name: "dm".into(),
            guild_id: None,
        },
        content,
    )
}

/// Wait until the outbound has recorded at least `count` sends.
pub async fn wait_for_replies(outbound: &RecordingOutbound, count: usize) -> Vec<String> {
    for _ in 0..100 {
        let sent = outbound.sent().await;
        if sent.len() >= count {
            return sent.into_iter().map(|(_, text)| text).collect();
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "expected {count} replies, got {:?}",
        outbound.sent().await
    );
}
