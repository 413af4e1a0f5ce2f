//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Platform error: {0}")]
    Platform(#[from] chat_platform::PlatformError),

    #[error("Registration error: {0}")]
    Registry(#[from] dispatch_engine::RegistryError),

    #[error("Engine error: {0}")]
    Engine(#[from] dispatch_engine::EngineError),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
