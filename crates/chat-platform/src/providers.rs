//! Boundary traits the dispatch engine consumes, with in-memory
//! implementations for tests and single-process deployments.

use crate::error::PlatformError;
use crate::types::{Channel, Member, Role};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Capability to deliver text into a channel.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), PlatformError>;
}

/// Per-channel bot settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSettings {
    pub prefix: String,
    #[serde(default)]
    pub admin_prefix: Option<String>,
    pub lang: String,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            prefix: "!".into(),
            admin_prefix: None,
            lang: "en".into(),
        }
    }
}

/// Source of per-channel settings. May be backed by any persistent store.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn get(&self, channel: &Channel) -> ChannelSettings;
}

/// Settings held in memory: one default plus per-guild overrides.
pub struct InMemorySettings {
    default: ChannelSettings,
    overrides: RwLock<HashMap<String, ChannelSettings>>,
}

impl InMemorySettings {
    pub fn new(default: ChannelSettings) -> Self {
        Self {
            default,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    pub async fn set_guild(&self, guild_id: impl Into<String>, settings: ChannelSettings) {
        self.overrides
            .write()
            .await
            .insert(guild_id.into(), settings);
    }
}

#[async_trait]
impl SettingsProvider for InMemorySettings {
    async fn get(&self, channel: &Channel) -> ChannelSettings {
        if let Some(guild) = &channel.guild_id {
            if let Some(found) = self.overrides.read().await.get(guild) {
                return found.clone();
            }
        }
        self.default.clone()
    }
}

/// Answers "does this user hold this permission in this channel".
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    async fn has_permission(&self, channel: &Channel, user_id: &str, permission: &str) -> bool;
}

/// Permission oracle backed by a static user → permission-set map.
/// Users absent from the map hold no permissions.
#[derive(Default)]
pub struct StaticPermissions {
    grants: HashMap<String, HashSet<String>>,
}

impl StaticPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, user_id: impl Into<String>, permission: impl Into<String>) -> Self {
        self.grants
            .entry(user_id.into())
            .or_default()
            .insert(permission.into());
        self
    }
}

#[async_trait]
impl PermissionOracle for StaticPermissions {
    async fn has_permission(&self, _channel: &Channel, user_id: &str, permission: &str) -> bool {
        self.grants
            .get(user_id)
            .map(|set| set.contains(permission))
            .unwrap_or(false)
    }
}

/// Directory of guild entities, used when resolving `member`/`role`/`channel`
/// command arguments.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn members(&self, guild_id: &str) -> Vec<Member>;
    async fn roles(&self, guild_id: &str) -> Vec<Role>;
    async fn channels(&self, guild_id: &str) -> Vec<Channel>;
}

/// Directory held in memory, keyed by guild.
#[derive(Default)]
pub struct InMemoryDirectory {
    members: RwLock<HashMap<String, Vec<Member>>>,
    roles: RwLock<HashMap<String, Vec<Role>>>,
    channels: RwLock<HashMap<String, Vec<Channel>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_member(&self, guild_id: &str, member: Member) {
        self.members
            .write()
            .await
            .entry(guild_id.to_string())
            .or_default()
            .push(member);
    }

    pub async fn add_role(&self, guild_id: &str, role: Role) {
        self.roles
            .write()
            .await
            .entry(guild_id.to_string())
            .or_default()
            .push(role);
    }

    pub async fn add_channel(&self, guild_id: &str, channel: Channel) {
        self.channels
            .write()
            .await
            .entry(guild_id.to_string())
            .or_default()
            .push(channel);
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn members(&self, guild_id: &str) -> Vec<Member> {
        self.members
            .read()
            .await
            .get(guild_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn roles(&self, guild_id: &str) -> Vec<Role> {
        self.roles
            .read()
            .await
            .get(guild_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn channels(&self, guild_id: &str) -> Vec<Channel> {
        self.channels
            .read()
            .await
            .get(guild_id)
            .cloned()
            .unwrap_or_default()
    }
}

/// Outbound that records every send. Test double for the platform boundary.
#[derive(Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingOutbound {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All `(channel_id, text)` pairs sent so far.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn take(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl Outbound for RecordingOutbound {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), PlatformError> {
        debug!("recorded outbound to {}: {}", channel_id, text);
        self.sent
            .lock()
            .await
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild_channel(guild: &str) -> Channel {
        Channel {
            id: "c1".into(),
            name: "general".into(),
            guild_id: Some(guild.into()),
        }
    }

    #[tokio::test]
    async fn test_settings_default_and_override() {
        let settings = InMemorySettings::new(ChannelSettings::default());
        let got = settings.get(&guild_channel("g1")).await;
        assert_eq!(got.prefix, "!");
        assert_eq!(got.lang, "en");

        settings
            .set_guild(
                "g1",
                ChannelSettings {
                    prefix: "?".into(),
                    admin_prefix: Some("$".into()),
                    lang: "de".into(),
                },
            )
            .await;

        let got = settings.get(&guild_channel("g1")).await;
        assert_eq!(got.prefix, "?");
        assert_eq!(got.lang, "de");

        // Other guilds keep the default
        let got = settings.get(&guild_channel("g2")).await;
        assert_eq!(got.prefix, "!");
    }

    #[tokio::test]
    async fn test_static_permissions() {
        let oracle = StaticPermissions::new().grant("u1", "MANAGE_MESSAGES");
        let ch = guild_channel("g1");

        assert!(oracle.has_permission(&ch, "u1", "MANAGE_MESSAGES").await);
        assert!(!oracle.has_permission(&ch, "u1", "BAN_MEMBERS").await);
        assert!(!oracle.has_permission(&ch, "u2", "MANAGE_MESSAGES").await);
    }

    #[tokio::test]
    async fn test_directory_scoped_by_guild() {
        let dir = InMemoryDirectory::new();
        dir.add_member(
            "g1",
            Member {
                id: "u1".into(),
                name: "ana".into(),
                nickname: None,
            },
        )
        .await;

        assert_eq!(dir.members("g1").await.len(), 1);
        assert!(dir.members("g2").await.is_empty());
    }

    #[tokio::test]
    async fn test_recording_outbound() {
        let out = RecordingOutbound::new();
        out.send("c1", "hello").await.unwrap();
        out.send("c2", "bye").await.unwrap();

        let sent = out.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], ("c1".into(), "hello".into()));
    }
}
