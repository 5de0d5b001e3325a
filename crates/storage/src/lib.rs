//! SQLite-backed event storage for Skiff sessions.
//!
//! Every chat session leaves an audit trail here: each message, tool
//! call, and tool result is appended as an [`Event`] keyed by a
//! [`SessionId`], and the `sessions` / `logs` subcommands read it back.
//!
//! # Example
//!
//! ```no_run
//! use storage::{Event, EventKind, EventStore, Role, SessionId};
//!
//! let store = EventStore::open("events.db")?;
//!
//! let session_id = SessionId::new();
//! store.append(&Event::new(session_id, EventKind::SessionStart))?;
//! store.append(&Event::message(session_id, Role::User, "hello"))?;
//!
//! for event in store.load_events(session_id, None)? {
//!     println!("{}: {:?}", event.timestamp, event.kind);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod event;
mod store;

pub use error::{Error, Result};
pub use event::{Event, EventKind, Role, SessionId};
pub use store::{EventStore, SessionSummary};
