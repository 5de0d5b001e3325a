//! Filesystem path policy for tool calls.
//!
//! The model supplies tool arguments, including paths, and nothing about
//! the provider protocol constrains them. This crate decides whether a
//! tool may touch a given path. The default policy ([`Policy::workspace_only`])
//! confines all reads and writes to the process working directory; a
//! `skiff.toml` file can widen it with explicit patterns:
//!
//! ```toml
//! [allow]
//! read = ["src/**", "Cargo.toml"]
//! write = ["src/*"]
//! ```
//!
//! A denial is a [`Decision::Deny`] with a reason; the tool host turns it
//! into a textual tool result rather than aborting the turn.

mod error;
mod policy;
mod request;

pub use error::{Error, Result};
pub use policy::{AllowRules, Decision, Policy};
pub use request::{Access, PathRequest};
