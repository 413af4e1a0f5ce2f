//! Event model shared by every platform adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who sent a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    /// Stable platform identity.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether the author is another bot account.
    #[serde(default)]
    pub is_bot: bool,
}

/// Where a message was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Parent guild/server. `None` means a private conversation.
    #[serde(default)]
    pub guild_id: Option<String>,
}

/// A raw inbound message, as pushed by the gateway.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub author: Author,
    pub channel: Channel,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatEvent {
    pub fn new(author: Author, channel: Channel, content: impl Into<String>) -> Self {
        Self {
            author,
            channel,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether this event happened outside any guild.
    pub fn is_private(&self) -> bool {
        self.channel.guild_id.is_none()
    }
}

/// A guild member, as reported by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}
