use crate::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The provider call failed; fatal for the current turn.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The turn was cancelled by the caller.
    #[error("turn cancelled")]
    Cancelled,

    /// The backend kept requesting tools past the configured limit.
    #[error("turn exceeded {0} tool rounds")]
    TurnLimit(u32),

    /// A prompt was submitted while a turn was still running.
    #[error("a turn is already in flight")]
    TurnInFlight,
}

pub type Result<T> = std::result::Result<T, Error>;
