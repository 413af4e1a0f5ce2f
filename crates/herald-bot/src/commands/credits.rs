//! Credits commands - a small in-memory economy with a claim sub-command.

use async_trait::async_trait;
use dispatch_engine::{Command, CommandContext, CommandHandler, CommandSpec};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const CLAIM_AMOUNT: i64 = 100;

/// Per-user balances, kept in memory for the lifetime of the process.
#[derive(Default, Clone)]
pub struct CreditsLedger {
    balances: Arc<RwLock<HashMap<String, i64>>>,
}

impl CreditsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn balance(&self, user_id: &str) -> i64 {
        self.balances
            .read()
            .await
            .get(user_id)
            .copied()
            .unwrap_or(0)
    }

    pub async fn deposit(&self, user_id: &str, amount: i64) -> i64 {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(user_id.to_string()).or_insert(0);
        *balance += amount;
        *balance
    }
}

struct BalanceHandler {
    ledger: CreditsLedger,
}

#[async_trait]
impl CommandHandler for BalanceHandler {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let balance = self.ledger.balance(&ctx.container.event.author.id).await;
        ctx.responder
            .say(&format!("You have {balance} credit(s)."))
            .await?;
        Ok(())
    }
}

struct ClaimHandler {
    ledger: CreditsLedger,
}

#[async_trait]
impl CommandHandler for ClaimHandler {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let balance = self
            .ledger
            .deposit(&ctx.container.event.author.id, CLAIM_AMOUNT)
            .await;
        ctx.responder
            .say(&format!(
                "Claimed {CLAIM_AMOUNT} credits. You now have {balance}."
            ))
            .await?;
        Ok(())
    }
}

/// `!credits` shows the balance; `!credits claim` pays out on its own,
/// longer cooldown.
pub fn credits_command(ledger: CreditsLedger) -> Command {
    Command::new(
        CommandSpec::new("credits")
            .description("Show your credit balance.")
            .group("economy"),
        BalanceHandler {
            ledger: ledger.clone(),
        },
    )
    .subcommand(Command::new(
        CommandSpec::new("claim")
            .description("Claim your hourly credits.")
            .group("economy")
            .cooldown(Duration::from_secs(3600)),
        ClaimHandler { ledger },
    ))
}
