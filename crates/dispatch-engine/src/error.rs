//! Engine-level errors.
//!
//! Almost everything that can go wrong while processing one event is
//! contained (vetoes, rejections, handler faults); what remains is the
//! middleware abort path and schemas broken enough to be a programming
//! error. Registration faults live in [`crate::registry::RegistryError`].

use thiserror::Error;
use usage_resolver::UsageError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Middleware chain failed: {0}")]
    Middleware(#[source] anyhow::Error),

    #[error("Broken usage schema reached dispatch: {0}")]
    BrokenSchema(#[from] UsageError),
}
