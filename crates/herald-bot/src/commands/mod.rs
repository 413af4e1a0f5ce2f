//! Bot command handlers.

mod announce;
mod credits;
mod dice;
mod echo;
mod help;
mod ping;
mod profile;

pub use announce::announce_command;
pub use credits::{credits_command, CreditsLedger};
pub use dice::dice_command;
pub use echo::echo_command;
pub use help::help_command;
pub use ping::ping_command;
pub use profile::profile_command;
