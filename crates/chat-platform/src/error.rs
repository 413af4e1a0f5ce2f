//! Platform boundary errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Send failed for channel {channel}: {reason}")]
    Send { channel: String, reason: String },

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}
