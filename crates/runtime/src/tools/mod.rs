//! Tool registry and execution.

pub mod errors;
mod fs;
mod host;

pub use errors::ToolError;
pub use fs::FsToolHost;
pub use host::ToolHost;
