//! Pre-execution policy checks.
//!
//! The gate is an ordered list of guard functions, each independently
//! testable: guild-only, admin-only, permissions, cooldown. Administrators
//! bypass everything except the guild-only guard; a guild-only command
//! acts on guild state and is meaningless in a DM no matter who asks.

use crate::command::CommandSpec;
use crate::container::Container;
use crate::cooldown::CooldownLedger;
use chat_platform::PermissionOracle;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Why the gate refused an invocation. Every variant is user-facing.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    GuildOnly,
    AdminOnly,
    MissingPermissions(Vec<String>),
    Cooldown { remaining: Duration },
}

pub struct Gate {
    admins: HashSet<String>,
    oracle: Arc<dyn PermissionOracle>,
}

impl Gate {
    pub fn new(admins: HashSet<String>, oracle: Arc<dyn PermissionOracle>) -> Self {
        Self { admins, oracle }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }

    pub async fn check(
        &self,
        spec: &CommandSpec,
        cooldowns: &CooldownLedger,
        container: &Container,
    ) -> Result<(), Rejection> {
        guild_only_guard(spec, container)?;

        if self.is_admin(&container.event.author.id) {
            return Ok(());
        }

        admin_only_guard(spec)?;
        self.permissions_guard(spec, container).await?;
        cooldown_guard(spec, cooldowns, container).await?;
        Ok(())
    }

    async fn permissions_guard(
        &self,
        spec: &CommandSpec,
        container: &Container,
    ) -> Result<(), Rejection> {
        let mut missing = Vec::new();
        for permission in &spec.permissions {
            let held = self
                .oracle
                .has_permission(
                    &container.event.channel,
                    &container.event.author.id,
                    permission,
                )
                .await;
            if !held {
                missing.push(permission.clone());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Rejection::MissingPermissions(missing))
        }
    }
}

fn guild_only_guard(spec: &CommandSpec, container: &Container) -> Result<(), Rejection> {
    if spec.guild_only && container.is_private {
        return Err(Rejection::GuildOnly);
    }
    Ok(())
}

fn admin_only_guard(spec: &CommandSpec) -> Result<(), Rejection> {
    if spec.admin_only {
        return Err(Rejection::AdminOnly);
    }
    Ok(())
}

async fn cooldown_guard(
    spec: &CommandSpec,
    cooldowns: &CooldownLedger,
    container: &Container,
) -> Result<(), Rejection> {
    cooldowns
        .check(
            &container.event.channel.id,
            &container.event.author.id,
            spec.cooldown,
        )
        .await
        .map_err(|remaining| Rejection::Cooldown { remaining })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chat_platform::{Author, Channel, ChatEvent};
    use mockall::mock;

    mock! {
        Oracle {}

        #[async_trait]
        impl PermissionOracle for Oracle {
            async fn has_permission(
                &self,
                channel: &Channel,
                user_id: &str,
                permission: &str,
            ) -> bool;
        }
    }

    fn container(user: &str, guild: Option<&str>) -> Container {
        Container::new(ChatEvent::new(
            Author {
                id: user.into(),
                name: user.into(),
                is_bot: false,
            },
            Channel {
                id: "c1".into(),
                name: "general".into(),
                guild_id: guild.map(String::from),
            },
            "!x",
        ))
    }

    fn gate_with(oracle: MockOracle, admins: &[&str]) -> Gate {
        Gate::new(
            admins.iter().map(|a| a.to_string()).collect(),
            Arc::new(oracle),
        )
    }

    #[tokio::test]
    async fn test_guild_only_rejects_private_context() {
        let gate = gate_with(MockOracle::new(), &[]);
        let spec = CommandSpec::new("queue").guild_only();
        let cooldowns = CooldownLedger::new();

        let err = gate
            .check(&spec, &cooldowns, &container("u1", None))
            .await
            .unwrap_err();
        assert_eq!(err, Rejection::GuildOnly);

        assert!(gate
            .check(&spec, &cooldowns, &container("u1", Some("g1")))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_admin_does_not_bypass_guild_only() {
        let gate = gate_with(MockOracle::new(), &["boss"]);
        let spec = CommandSpec::new("queue").guild_only();
        let cooldowns = CooldownLedger::new();

        let err = gate
            .check(&spec, &cooldowns, &container("boss", None))
            .await
            .unwrap_err();
        assert_eq!(err, Rejection::GuildOnly);
    }

    #[tokio::test]
    async fn test_admin_only_command() {
        let gate = gate_with(MockOracle::new(), &["boss"]);
        let spec = CommandSpec::new("purge").admin_only();
        let cooldowns = CooldownLedger::new();

        let err = gate
            .check(&spec, &cooldowns, &container("u1", Some("g1")))
            .await
            .unwrap_err();
        assert_eq!(err, Rejection::AdminOnly);

        assert!(gate
            .check(&spec, &cooldowns, &container("boss", Some("g1")))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_missing_permissions_are_enumerated() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_has_permission()
            .returning(|_, _, permission| permission == "KICK_MEMBERS");
        let gate = gate_with(oracle, &[]);

        let spec = CommandSpec::new("kick")
            .permission("KICK_MEMBERS")
            .permission("BAN_MEMBERS");
        let cooldowns = CooldownLedger::new();

        let err = gate
            .check(&spec, &cooldowns, &container("u1", Some("g1")))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Rejection::MissingPermissions(vec!["BAN_MEMBERS".into()])
        );
    }

    #[tokio::test]
    async fn test_admin_bypasses_permissions_and_cooldown() {
        // Oracle would deny everything; it must never be consulted.
        let mut oracle = MockOracle::new();
        oracle.expect_has_permission().never();
        let gate = gate_with(oracle, &["boss"]);

        let spec = CommandSpec::new("kick")
            .permission("KICK_MEMBERS")
            .cooldown(Duration::from_secs(60));
        let cooldowns = CooldownLedger::new();

        for _ in 0..3 {
            assert!(gate
                .check(&spec, &cooldowns, &container("boss", Some("g1")))
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn test_cooldown_rejection_carries_remaining() {
        let gate = gate_with(MockOracle::new(), &[]);
        let spec = CommandSpec::new("ping").cooldown(Duration::from_secs(5));
        let cooldowns = CooldownLedger::new();
        let container = container("u1", Some("g1"));

        assert!(gate.check(&spec, &cooldowns, &container).await.is_ok());
        match gate.check(&spec, &cooldowns, &container).await {
            Err(Rejection::Cooldown { remaining }) => assert!(remaining > Duration::ZERO),
            other => panic!("expected cooldown rejection, got {other:?}"),
        }
    }
}
