//! Skiff runtime — backend-neutral conversation orchestration.
//!
//! This crate provides the core of the assistant: a provider-agnostic
//! conversation model, wire adapters for the supported LLM providers,
//! the filesystem tool set, and the turn loop that drives them.
//!
//! # Overview
//!
//! The runtime is organized around these concepts:
//!
//! - **Conversation**: an append-only transcript of [`Message`]s whose
//!   [`Part`]s carry text, tool calls, and tool results uniformly
//!   across providers.
//! - **Backend**: a trait abstracting one provider API (Gemini,
//!   OpenAI, Anthropic); each adapter owns its wire format.
//! - **ToolHost**: the tool registry the turn loop executes against.
//! - **Orchestrator**: the facade the UI drives — submit a prompt,
//!   consume [`TurnEvent`]s, cancel.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{Orchestrator, Provider};
//! use policy::Policy;
//!
//! # async fn example() -> runtime::Result<()> {
//! let orch = Orchestrator::with_fs_tools(
//!     Provider::Anthropic,
//!     "sk-ant-api01-...",
//!     "claude-sonnet-4-20250514",
//!     Policy::workspace_only(),
//! )
//! .build();
//!
//! let mut turn = orch.submit("list the project files")?;
//! while let Some(event) = turn.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
pub mod models;
mod orchestrator;
pub mod prompt;
pub mod providers;
mod session;
pub mod tools;

// Conversation model (provider-agnostic)
pub use model::{
    Backend, Conversation, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall,
    ToolResult, ToolSpec, Usage,
};

// Provider adapters
pub use providers::{Provider, ProviderBackend};

// Tools
pub use tools::{FsToolHost, ToolError, ToolHost};

// Turn loop and facade
pub use orchestrator::{Orchestrator, OrchestratorBuilder, TurnHandle};
pub use session::{Session, TurnEvent};

// Error types
pub use error::{Error, Result};
