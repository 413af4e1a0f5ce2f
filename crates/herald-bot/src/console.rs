//! Console gateway: stdin lines become chat events, replies print to
//! stdout. Lets the bot run end-to-end without any platform connection.

use async_trait::async_trait;
use chat_platform::{Author, Channel, ChatEvent, Outbound, PlatformError};
use tokio::io::AsyncBufReadExt;
use tokio_stream::Stream;
use tracing::error;

pub const CONSOLE_CHANNEL: &str = "console";
pub const OPERATOR_ID: &str = "operator";

/// Outbound that prints to the terminal.
pub struct ConsoleOutbound;

#[async_trait]
impl Outbound for ConsoleOutbound {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), PlatformError> {
        println!("[{channel_id}] {text}");
        Ok(())
    }
}

pub fn operator() -> Author {
    Author {
        id: OPERATOR_ID.into(),
        name: "operator".into(),
        is_bot: false,
    }
}

/// The console pretends to be a guild channel so guild-only commands work.
pub fn console_channel() -> Channel {
    Channel {
        id: CONSOLE_CHANNEL.into(),
        name: "console".into(),
        guild_id: Some(CONSOLE_CHANNEL.into()),
    }
}

/// Read stdin line by line as an event stream.
pub fn event_stream() -> impl Stream<Item = ChatEvent> {
    let author = operator();
    let channel = console_channel();

    async_stream::stream! {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    yield ChatEvent::new(author.clone(), channel.clone(), line);
                }
                Ok(None) => break,
                Err(e) => {
                    error!("stdin read error: {}", e);
                    break;
                }
            }
        }
    }
}
