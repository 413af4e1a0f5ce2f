//! Declarative argument validation and coercion for chat commands.
//!
//! A command declares its positional arguments as an ordered list of
//! [`UsageSpec`] entries; [`resolve`] walks raw message tokens against the
//! schema and produces a typed `{name: value}` map, or a structured,
//! user-presentable [`UsageError`]. Entity types (`member`, `role`,
//! `channel`) resolve against a [`chat_platform::Directory`]; the `command`
//! type resolves against whatever [`CommandIndex`] the embedding registry
//! provides.

mod error;
mod resolve;
mod spec;
mod types;

pub use error::UsageError;
pub use resolve::{resolve, tokenize};
pub use spec::{render_usage, ArgType, UsageSpec};
pub use types::{ArgValue, CommandIndex, CommandMeta, NoCommands, ResolveContext, ResolvedArgs};
