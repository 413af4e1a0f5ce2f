//! Structured argument-resolution errors.
//!
//! Everything here except [`UsageError::UnnamedSpec`] is user-facing and is
//! rendered as a reply to the invoking channel; `UnnamedSpec` is a
//! configuration fault and should abort command registration instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UsageError {
    #[error("Expected at least {required} argument(s) but got {provided}.\nUsage: {usage}")]
    InsufficientArguments {
        required: usize,
        provided: usize,
        usage: String,
    },

    #[error("Unterminated quote in arguments.")]
    UnterminatedQuote,

    #[error("Invalid value for {argument}: {reason}\nUsage: {usage}")]
    Invalid {
        argument: String,
        reason: String,
        usage: String,
    },

    #[error("Could not find a {argument} matching \"{query}\".\nUsage: {usage}")]
    NotFound {
        argument: String,
        query: String,
        usage: String,
    },

    #[error("Usage spec at position {index} has no name")]
    UnnamedSpec { index: usize },
}

impl UsageError {
    /// Whether this error indicates a broken schema rather than bad input.
    pub fn is_config_fault(&self) -> bool {
        matches!(self, UsageError::UnnamedSpec { .. })
    }
}
