//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The database file does not exist yet.
    #[error("database not found at {path}. Run 'skiff chat' first")]
    DatabaseNotFound { path: PathBuf },

    /// No API key for the selected provider, in config or environment.
    #[error("no API key for {provider}: set {env_var} or add it to the config file")]
    MissingApiKey {
        provider: String,
        env_var: &'static str,
    },

    /// Configuration is invalid or unreadable.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    #[error(transparent)]
    Storage(#[from] storage::Error),

    #[error(transparent)]
    Policy(#[from] policy::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
