//! Execution context handed to command handlers.

use crate::collector::{CollectOptions, Collector, CollectorSet, EndReason};
use crate::container::Container;
use crate::registry::{CommandRegistry, RegistryIndex};
use crate::responder::Responder;
use chat_platform::{Directory, PlatformError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use usage_resolver::{resolve, tokenize, ResolveContext, ResolvedArgs, UsageSpec};

/// Limits applied to handler-opened dialogs.
#[derive(Debug, Clone)]
pub struct DialogPolicy {
    pub timeout: Duration,
    /// Answers (valid or not) allowed per step. Re-prompts count, so a
    /// dialog always terminates.
    pub tries: usize,
    pub cancel_keyword: String,
}

impl Default for DialogPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            tries: 5,
            cancel_keyword: "cancel".into(),
        }
    }
}

/// One prompt in a dialog: send `prompt`, then resolve the user's answer
/// against `usage`.
pub struct DialogStep {
    pub prompt: String,
    pub usage: Vec<UsageSpec>,
}

impl DialogStep {
    pub fn new(prompt: impl Into<String>, usage: Vec<UsageSpec>) -> Self {
        Self {
            prompt: prompt.into(),
            usage,
        }
    }
}

/// How a dialog ended short of completion. `Cancelled` (the user typed the
/// cancel keyword) is distinct from `Timeout` so callers can word their
/// notices accordingly.
#[derive(Error, Debug)]
pub enum DialogError {
    #[error("dialog cancelled by the user")]
    Cancelled,

    #[error("dialog timed out waiting for input")]
    Timeout,

    #[error("dialog attempt limit reached")]
    Exhausted,

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Everything a handler may touch: the annotated container, a responder
/// into the invoking channel, and the collector machinery for follow-ups.
pub struct CommandContext {
    pub container: Container,
    pub responder: Responder,
    /// Possibly composite label, e.g. `"credits claim"`.
    pub label: String,
    pub(crate) collectors: Arc<CollectorSet>,
    pub(crate) registry: Arc<RwLock<CommandRegistry>>,
    pub(crate) directory: Arc<dyn Directory>,
    pub(crate) is_admin: bool,
    pub(crate) dialog_policy: DialogPolicy,
}

impl CommandContext {
    pub fn arg(&self, name: &str) -> Option<&usage_resolver::ArgValue> {
        self.container.args.get(name)
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Shared view of the registry, for help-style listings.
    pub fn registry(&self) -> Arc<RwLock<CommandRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Open a raw collector. Most handlers want [`CommandContext::dialog`]
    /// instead.
    pub async fn collect(&self, options: CollectOptions) -> Collector {
        self.collectors.open(options).await
    }

    /// Run a multi-step prompt/collect/validate conversation with the
    /// invoking user, returning the accumulated argument map.
    ///
    /// Invalid answers are re-prompted with the resolution error; the cancel
    /// keyword aborts with [`DialogError::Cancelled`]. The collector behind
    /// each step is released on every exit path.
    pub async fn dialog(&self, steps: &[DialogStep]) -> Result<ResolvedArgs, DialogError> {
        let mut out = ResolvedArgs::new();

        for step in steps {
            // Open before prompting so an eager answer can't slip past into
            // normal dispatch.
            let options = CollectOptions::for_event(&self.container.event)
                .matches(self.dialog_policy.tries)
                .tries(self.dialog_policy.tries)
                .timeout(self.dialog_policy.timeout);
            let mut collector = self.collectors.open(options).await;

            self.responder.say(&step.prompt).await?;

            loop {
                match collector.next().await {
                    Ok(answer) => {
                        let text = answer.content.trim();
                        if text.eq_ignore_ascii_case(&self.dialog_policy.cancel_keyword) {
                            collector.stop(EndReason::Cancelled).await;
                            return Err(DialogError::Cancelled);
                        }

                        let tokens = tokenize(text);
                        match self.resolve_step(&tokens, &step.usage).await {
                            Ok(values) => {
                                out.extend(values);
                                collector.stop(EndReason::Stopped).await;
                                break;
                            }
                            Err(error) => {
                                debug!(%error, "dialog answer rejected, re-prompting");
                                self.responder
                                    .notice(
                                        "dialog.retry",
                                        &[
                                            ("error", error.to_string()),
                                            (
                                                "cancel",
                                                self.dialog_policy.cancel_keyword.clone(),
                                            ),
                                        ],
                                    )
                                    .await?;
                            }
                        }
                    }
                    Err(EndReason::Timeout) => return Err(DialogError::Timeout),
                    Err(EndReason::Cancelled) => return Err(DialogError::Cancelled),
                    Err(_) => return Err(DialogError::Exhausted),
                }
            }
        }

        Ok(out)
    }

    async fn resolve_step(
        &self,
        tokens: &[String],
        usage: &[UsageSpec],
    ) -> Result<ResolvedArgs, usage_resolver::UsageError> {
        let index = RegistryIndex::new(Arc::clone(&self.registry));
        let ctx = ResolveContext {
            prefix: &self.container.settings.prefix,
            label: &self.label,
            guild_id: self.container.event.channel.guild_id.as_deref(),
            directory: self.directory.as_ref(),
            commands: &index,
            invoker_is_admin: self.is_admin,
        };
        resolve(tokens, usage, &ctx).await
    }
}
