use serde::{Deserialize, Serialize};

/// The kind of filesystem access being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Read,
    Write,
}

/// A request to touch a path on behalf of a tool call.
#[derive(Debug, Clone)]
pub struct PathRequest {
    pub access: Access,
    /// The path exactly as the tool call supplied it.
    pub path: String,
}

impl PathRequest {
    pub fn read(path: impl Into<String>) -> Self {
        Self {
            access: Access::Read,
            path: path.into(),
        }
    }

    pub fn write(path: impl Into<String>) -> Self {
        Self {
            access: Access::Write,
            path: path.into(),
        }
    }
}
