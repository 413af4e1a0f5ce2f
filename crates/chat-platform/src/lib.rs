//! Platform boundary contracts for the herald dispatch engine.
//!
//! The engine never talks to a chat service directly; it consumes the
//! traits defined here (outbound send, settings, permissions, entity
//! directory) and reacts to [`ChatEvent`]s pushed into it. In-memory
//! implementations are provided for tests and single-process bots.

mod error;
pub mod format;
mod localize;
mod providers;
mod types;

pub use error::PlatformError;
pub use localize::{Localizer, DEFAULT_LANG};
pub use providers::{
    ChannelSettings, Directory, InMemoryDirectory, InMemorySettings, Outbound, PermissionOracle,
    RecordingOutbound, SettingsProvider, StaticPermissions,
};
pub use types::{Author, Channel, ChatEvent, Member, Role};
