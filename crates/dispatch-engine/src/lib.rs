//! Dispatch engine for prefix-command chat bots.
//!
//! An inbound [`chat_platform::ChatEvent`] flows through a prioritized
//! middleware chain into command dispatch: registry lookup (with alias and
//! sub-command routing), the cooldown/permission gate, argument resolution
//! via `usage-resolver`, and finally the handler, which may hold multi-turn
//! dialogs through collectors. Failure containment is the core contract:
//! nothing one event does can take the process down.

mod collector;
mod command;
mod container;
mod context;
mod cooldown;
mod engine;
mod error;
mod gate;
mod middleware;
mod registry;
mod responder;
pub mod steps;

pub use collector::{CollectOptions, Collector, CollectorSet, EndReason};
pub use command::{Command, CommandHandler, CommandSpec, NoopHandler, ReplyHandler};
pub use container::Container;
pub use context::{CommandContext, DialogError, DialogPolicy, DialogStep};
pub use cooldown::CooldownLedger;
pub use engine::{Engine, EngineOptions, Outcome};
pub use error::EngineError;
pub use gate::{Gate, Rejection};
pub use middleware::{Middleware, MiddlewareChain};
pub use registry::{CommandRegistry, RegistryError, RegistryIndex};
pub use responder::Responder;
