use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// `NotFound` and `InvalidInput` cause the call to be skipped; everything
/// else degrades into a textual result fed back to the model. None of
/// these abort a turn.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The requested tool name is not in the registry.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// A required argument is missing or has the wrong type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The path policy rejected the request.
    #[error("denied: {0}")]
    Denied(String),

    /// The filesystem operation failed.
    #[error("io: {0}")]
    Io(String),
}
