//! The engine: ties chain output to registry lookup and execution.

use crate::collector::{CollectOptions, Collector, CollectorSet};
use crate::command::Command;
use crate::container::Container;
use crate::context::{CommandContext, DialogPolicy};
use crate::error::EngineError;
use crate::gate::{Gate, Rejection};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::registry::{CommandRegistry, RegistryError, RegistryIndex};
use crate::responder::Responder;
use chat_platform::{ChatEvent, Directory, Localizer, Outbound, PermissionOracle};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use usage_resolver::{resolve, ResolveContext};

/// Process-wide engine knobs.
pub struct EngineOptions {
    /// Identities that bypass admin-only, permission, and cooldown guards.
    pub admins: HashSet<String>,
    /// Platform message length limit, for chunking.
    pub max_message_len: usize,
    pub dialog: DialogPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            admins: HashSet::new(),
            max_message_len: 2000,
            dialog: DialogPolicy::default(),
        }
    }
}

/// What became of one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An open collector consumed the event before dispatch.
    Collected,
    /// Middleware vetoed the event, or no trigger was extracted.
    Dropped,
    /// The trigger matched no registered command.
    Unknown,
    /// The gate refused the invocation; the user was notified.
    Rejected(Rejection),
    /// Argument resolution failed; the user was notified.
    InvalidUsage,
    /// The handler ran (its own faults are contained and logged).
    Completed,
}

pub struct Engine {
    chain: RwLock<MiddlewareChain>,
    registry: Arc<RwLock<CommandRegistry>>,
    collectors: Arc<CollectorSet>,
    gate: Gate,
    outbound: Arc<dyn Outbound>,
    directory: Arc<dyn Directory>,
    localizer: Arc<Localizer>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(
        outbound: Arc<dyn Outbound>,
        directory: Arc<dyn Directory>,
        oracle: Arc<dyn PermissionOracle>,
        localizer: Arc<Localizer>,
        options: EngineOptions,
    ) -> Self {
        let gate = Gate::new(options.admins.clone(), oracle);
        Self {
            chain: RwLock::new(MiddlewareChain::new()),
            registry: Arc::new(RwLock::new(CommandRegistry::new())),
            collectors: Arc::new(CollectorSet::new()),
            gate,
            outbound,
            directory,
            localizer,
            options,
        }
    }

    pub async fn register_middleware(&self, step: Middleware) {
        self.chain.write().await.register(step);
    }

    pub async fn attach(&self, command: Command) -> Result<(), RegistryError> {
        self.registry.write().await.attach(command)
    }

    pub fn registry(&self) -> Arc<RwLock<CommandRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Open a collector outside any handler, e.g. from platform glue.
    pub async fn collect(&self, options: CollectOptions) -> Collector {
        self.collectors.open(options).await
    }

    /// Tear down the registry and re-run a registration function. The hook
    /// behind out-of-band `reload_plugins` signals.
    pub async fn reload_commands<F>(&self, install: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut CommandRegistry) -> Result<(), RegistryError>,
    {
        let mut registry = self.registry.write().await;
        registry.clear();
        install(&mut registry)
    }

    /// Same, for the middleware chain.
    pub async fn reload_middleware<F>(&self, install: F)
    where
        F: FnOnce(&mut MiddlewareChain),
    {
        let mut chain = self.chain.write().await;
        chain.clear();
        install(&mut chain);
    }

    /// Drive one inbound event through collectors, the middleware chain,
    /// and command dispatch.
    ///
    /// Nothing an individual event does may take the process down: vetoes
    /// and rejections are outcomes, handler faults are logged inside
    /// [`Command::invoke`], and only middleware aborts surface as errors
    /// for the caller to log.
    pub async fn handle(&self, event: ChatEvent) -> Result<Outcome, EngineError> {
        if self.collectors.offer(&event).await {
            debug!(
                channel = %event.channel.id,
                author = %event.author.id,
                "event consumed by open collector"
            );
            return Ok(Outcome::Collected);
        }

        let container = Container::new(event);
        let container = {
            let chain = self.chain.read().await;
            chain.run(container).await.map_err(EngineError::Middleware)?
        };
        let Some(container) = container else {
            return Ok(Outcome::Dropped);
        };

        let Some(trigger) = container.trigger().map(str::to_string) else {
            debug!("no trigger extracted, dropping");
            return Ok(Outcome::Dropped);
        };

        let Some(command) = self.registry.read().await.lookup(&trigger) else {
            debug!(trigger, "trigger not registered, ignoring");
            return Ok(Outcome::Unknown);
        };

        let (active, label, container) = route_subcommand(command, container);

        let responder = Responder::new(
            Arc::clone(&self.outbound),
            Arc::clone(&self.localizer),
            container.event.channel.id.clone(),
            container.settings.lang.clone(),
            self.options.max_message_len,
        );

        if let Err(rejection) = self
            .gate
            .check(&active.spec, &active.cooldowns, &container)
            .await
        {
            debug!(command = %label, ?rejection, "gate refused invocation");
            self.notify_rejection(&responder, &label, &rejection).await;
            return Ok(Outcome::Rejected(rejection));
        }

        let mut container = container;
        let resolved = {
            let index = RegistryIndex::new(Arc::clone(&self.registry));
            let ctx = ResolveContext {
                prefix: &container.settings.prefix,
                label: &label,
                guild_id: container.event.channel.guild_id.as_deref(),
                directory: self.directory.as_ref(),
                commands: &index,
                invoker_is_admin: self.gate.is_admin(&container.event.author.id),
            };
            resolve(&container.raw_args, &active.spec.usage, &ctx).await
        };

        match resolved {
            Ok(args) => container.args = args,
            Err(error) if error.is_config_fault() => return Err(error.into()),
            Err(error) => {
                if let Err(send_error) = responder.say(&error.to_string()).await {
                    warn!(%send_error, "failed to deliver usage error");
                }
                return Ok(Outcome::InvalidUsage);
            }
        }

        let is_admin = self.gate.is_admin(&container.event.author.id);
        let ctx = CommandContext {
            container,
            responder,
            label,
            collectors: Arc::clone(&self.collectors),
            registry: Arc::clone(&self.registry),
            directory: Arc::clone(&self.directory),
            is_admin,
            dialog_policy: self.options.dialog.clone(),
        };

        active.invoke(&ctx).await;
        Ok(Outcome::Completed)
    }

    async fn notify_rejection(&self, responder: &Responder, label: &str, rejection: &Rejection) {
        let command = ("command", label.to_string());
        let result = match rejection {
            Rejection::GuildOnly => responder.notice("gate.guild_only", &[command]).await,
            Rejection::AdminOnly => responder.notice("gate.admin_only", &[command]).await,
            Rejection::MissingPermissions(missing) => {
                responder
                    .notice(
                        "gate.missing_permissions",
                        &[command, ("permissions", missing.join(", "))],
                    )
                    .await
            }
            Rejection::Cooldown { remaining } => {
                let seconds = remaining.as_secs_f64().ceil() as u64;
                responder
                    .notice(
                        "gate.cooldown",
                        &[command, ("remaining", seconds.to_string())],
                    )
                    .await
            }
        };
        if let Err(send_error) = result {
            warn!(%send_error, "failed to deliver gate notice");
        }
    }
}

/// Pick the active command and composite label for an invocation.
fn route_subcommand(
    command: Arc<Command>,
    mut container: Container,
) -> (Arc<Command>, String, Container) {
    let base = command.spec.name().to_string();
    if command.subcommands().is_empty() {
        return (command, base, container);
    }

    if let Some(first) = container.raw_args.first().map(|t| t.to_lowercase()) {
        if let Some(sub) = command.subcommands().get(&first) {
            container.raw_args.remove(0);
            let label = format!("{base} {}", sub.spec.name());
            return (Arc::clone(sub), label, container);
        }
    }

    // Explicit override routes without consuming a token.
    if let Some(name) = &command.spec.subcommand {
        if let Some(sub) = command.subcommands().get(name) {
            let label = format!("{base} {}", sub.spec.name());
            return (Arc::clone(sub), label, container);
        }
    }

    (command, base, container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandSpec, ReplyHandler};
    use crate::steps;
    use chat_platform::{
        Author, Channel, ChannelSettings, ChatEvent, InMemoryDirectory, InMemorySettings,
        RecordingOutbound, StaticPermissions,
    };
    use std::time::Duration;
    use usage_resolver::UsageSpec;

    fn user_event(content: &str) -> ChatEvent {
        ChatEvent::new(
            Author {
                id: "u1".into(),
                name: "ana".into(),
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

    async fn engine_with(outbound: Arc<RecordingOutbound>) -> Engine {
        let engine = Engine::new(
            outbound,
            Arc::new(InMemoryDirectory::new()),
            Arc::new(StaticPermissions::new()),
            Arc::new(Localizer::with_defaults()),
            EngineOptions::default(),
        );
        engine
            .register_middleware(steps::settings_step(
                30,
                Arc::new(InMemorySettings::new(ChannelSettings::default())),
            ))
            .await;
        engine.register_middleware(steps::prefix_parser(40)).await;
        engine
    }

    #[tokio::test]
    async fn test_dispatch_completes_and_replies() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;
        engine
            .attach(Command::new(
                CommandSpec::new("ping"),
                ReplyHandler("pong".into()),
            ))
            .await
            .unwrap();

        let outcome = engine.handle(user_event("!ping")).await.unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(outbound.sent().await, vec![("c1".into(), "pong".into())]);
    }

    #[tokio::test]
    async fn test_unknown_trigger_is_silent() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;

        let outcome = engine.handle(user_event("!nope")).await.unwrap();
        assert_eq!(outcome, Outcome::Unknown);
        assert!(outbound.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_unprefixed_content_is_dropped() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;

        let outcome = engine.handle(user_event("just chatting")).await.unwrap();
        assert_eq!(outcome, Outcome::Dropped);
        assert!(outbound.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_cooldown_rejection_notifies_remaining() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;
        engine
            .attach(Command::new(
                CommandSpec::new("ping").cooldown(Duration::from_secs(5)),
                ReplyHandler("pong".into()),
            ))
            .await
            .unwrap();

        assert_eq!(
            engine.handle(user_event("!ping")).await.unwrap(),
            Outcome::Completed
        );
        let outcome = engine.handle(user_event("!ping")).await.unwrap();
        assert!(matches!(outcome, Outcome::Rejected(Rejection::Cooldown { .. })));

        let sent = outbound.sent().await;
        assert_eq!(sent.len(), 2);
        assert!(sent[1].1.contains("again in 5 second(s)"), "got: {}", sent[1].1);
    }

    #[tokio::test]
    async fn test_open_collector_preempts_dispatch() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;
        engine
            .attach(Command::new(
                CommandSpec::new("ping"),
                ReplyHandler("pong".into()),
            ))
            .await
            .unwrap();

        let trigger = user_event("!ask");
        let mut collector = engine
            .collect(CollectOptions::for_event(&trigger).timeout(Duration::from_secs(5)))
            .await;

        // Looks like a valid command, but belongs to the conversation
        let outcome = engine.handle(user_event("!ping")).await.unwrap();
        assert_eq!(outcome, Outcome::Collected);
        assert!(outbound.sent().await.is_empty());
        assert_eq!(collector.next().await.unwrap().content, "!ping");
    }

    #[tokio::test]
    async fn test_subcommand_routing() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;

        let credits = Command::new(
            CommandSpec::new("credits"),
            ReplyHandler("you have 100 credits".into()),
        )
        .subcommand(Command::new(
            CommandSpec::new("claim"),
            ReplyHandler("claimed your daily credits".into()),
        ));
        engine.attach(credits).await.unwrap();

        engine.handle(user_event("!credits claim")).await.unwrap();
        engine.handle(user_event("!credits")).await.unwrap();

        let sent = outbound.sent().await;
        assert_eq!(sent[0].1, "claimed your daily credits");
        assert_eq!(sent[1].1, "you have 100 credits");
    }

    #[tokio::test]
    async fn test_explicit_subcommand_override_routes_without_token() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;

        let queue = Command::new(
            CommandSpec::new("queue").route_to("show"),
            ReplyHandler("base handler".into()),
        )
        .subcommand(Command::new(
            CommandSpec::new("show").arg(UsageSpec::string("extra").optional()),
            ReplyHandler("current queue: empty".into()),
        ));
        engine.attach(queue).await.unwrap();

        // No sub-command token: the override routes to `show` and the token
        // stays available as an argument.
        engine.handle(user_event("!queue soon")).await.unwrap();
        let sent = outbound.take().await;
        assert_eq!(sent[0].1, "current queue: empty");
    }

    #[tokio::test]
    async fn test_reload_middleware_swaps_chain() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;
        engine
            .attach(Command::new(
                CommandSpec::new("ping"),
                ReplyHandler("pong".into()),
            ))
            .await
            .unwrap();

        // Drop the parser from the chain: nothing gets a trigger anymore
        engine
            .reload_middleware(|chain| {
                chain.register(steps::settings_step(
                    30,
                    Arc::new(InMemorySettings::new(ChannelSettings::default())),
                ));
            })
            .await;
        assert_eq!(
            engine.handle(user_event("!ping")).await.unwrap(),
            Outcome::Dropped
        );

        // Reinstall the full chain and dispatch works again
        engine
            .reload_middleware(|chain| {
                chain.register(steps::settings_step(
                    30,
                    Arc::new(InMemorySettings::new(ChannelSettings::default())),
                ));
                chain.register(steps::prefix_parser(40));
            })
            .await;
        assert_eq!(
            engine.handle(user_event("!ping")).await.unwrap(),
            Outcome::Completed
        );
    }

    #[tokio::test]
    async fn test_subcommand_usage_error_uses_composite_label() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;

        let credits = Command::new(CommandSpec::new("credits"), ReplyHandler("balance".into()))
            .subcommand(Command::new(
                CommandSpec::new("give").arg(UsageSpec::string("target")),
                ReplyHandler("sent".into()),
            ));
        engine.attach(credits).await.unwrap();

        let outcome = engine.handle(user_event("!credits give")).await.unwrap();
        assert_eq!(outcome, Outcome::InvalidUsage);

        let sent = outbound.sent().await;
        assert!(sent[0].1.contains("!credits give <target>"), "got: {}", sent[0].1);
    }

    #[tokio::test]
    async fn test_invalid_usage_replies_and_skips_handler() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;
        engine
            .attach(Command::new(
                CommandSpec::new("give").arg(UsageSpec::string("target")),
                ReplyHandler("done".into()),
            ))
            .await
            .unwrap();

        let outcome = engine.handle(user_event("!give")).await.unwrap();
        assert_eq!(outcome, Outcome::InvalidUsage);

        let sent = outbound.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Usage: !give <target>"), "got: {}", sent[0].1);
    }

    #[tokio::test]
    async fn test_reload_commands_swaps_registry() {
        let outbound = RecordingOutbound::new();
        let engine = engine_with(outbound.clone()).await;
        engine
            .attach(Command::new(
                CommandSpec::new("ping"),
                ReplyHandler("pong".into()),
            ))
            .await
            .unwrap();

        engine
            .reload_commands(|registry| {
                registry.attach(Command::new(
                    CommandSpec::new("dice"),
                    ReplyHandler("4".into()),
                ))
            })
            .await
            .unwrap();

        assert_eq!(
            engine.handle(user_event("!ping")).await.unwrap(),
            Outcome::Unknown
        );
        assert_eq!(
            engine.handle(user_event("!dice")).await.unwrap(),
            Outcome::Completed
        );
    }
}
