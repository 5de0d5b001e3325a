//! SQLite event store implementation.

use crate::{Error, Event, Result, SessionId};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;

/// SQLite-backed session log.
pub struct EventStore {
    conn: Connection,
}

/// One row of `list_sessions` output.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    /// Set once a `SessionEnd` event was recorded.
    pub ended_at: Option<DateTime<Utc>>,
    pub message_count: u64,
}

impl EventStore {
    /// Open or create an event store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory event store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                kind TEXT NOT NULL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_session
                ON events(session_id, timestamp);
            "#,
        )?;
        Ok(())
    }

    /// Append one event.
    pub fn append(&self, event: &Event) -> Result<()> {
        self.conn.execute(
            "INSERT INTO events (id, session_id, timestamp, kind, data) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id.to_string(),
                event.session_id.to_string(),
                event.timestamp.to_rfc3339(),
                event.kind.name(),
                serde_json::to_string(&event.kind)?,
            ],
        )?;
        Ok(())
    }

    /// Load a session's events in timestamp order, optionally keeping
    /// only one kind (by its stable name, e.g. `"tool_call"`).
    pub fn load_events(&self, session_id: SessionId, kind: Option<&str>) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, timestamp, data FROM events
             WHERE session_id = ?1 AND (?2 IS NULL OR kind = ?2)
             ORDER BY timestamp, id",
        )?;

        let events = stmt
            .query_map(params![session_id.to_string(), kind], |row| {
                let id: String = row.get(0)?;
                let session_id: String = row.get(1)?;
                let timestamp: String = row.get(2)?;
                let data: String = row.get(3)?;
                Ok((id, session_id, timestamp, data))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, session_id, timestamp, data)| {
                Some(Event {
                    id: id.parse().ok()?,
                    session_id: SessionId(session_id.parse().ok()?),
                    timestamp: timestamp.parse().ok()?,
                    kind: serde_json::from_str(&data).ok()?,
                })
            })
            .collect();

        Ok(events)
    }

    /// Summaries for every recorded session, most recent activity first.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, MIN(timestamp),
                    MAX(CASE WHEN kind = 'session_end' THEN timestamp END),
                    SUM(CASE WHEN kind = 'message' THEN 1 ELSE 0 END)
             FROM events GROUP BY session_id ORDER BY MAX(timestamp) DESC",
        )?;

        let summaries = stmt
            .query_map([], |row| {
                let session_id: String = row.get(0)?;
                let started_at: String = row.get(1)?;
                let ended_at: Option<String> = row.get(2)?;
                let message_count: i64 = row.get(3)?;
                Ok((session_id, started_at, ended_at, message_count as u64))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(session_id, started_at, ended_at, message_count)| {
                Some(SessionSummary {
                    id: SessionId(session_id.parse().ok()?),
                    started_at: started_at.parse().ok()?,
                    ended_at: ended_at.and_then(|t| t.parse().ok()),
                    message_count,
                })
            })
            .collect();

        Ok(summaries)
    }

    /// Resolve a session id prefix (as printed by `sessions`) to the
    /// full id. Errors on no match or an ambiguous prefix.
    pub fn find_session(&self, prefix: &str) -> Result<SessionId> {
        let matches: Vec<SessionId> = self
            .list_sessions()?
            .into_iter()
            .map(|s| s.id)
            .filter(|id| id.to_string().starts_with(prefix))
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(Error::NotFound(format!("no session matching {prefix}"))),
            _ => Err(Error::NotFound(format!(
                "session prefix {prefix} is ambiguous ({} matches)",
                matches.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventKind, Role};
    use serde_json::json;

    #[test]
    fn append_then_load_round_trips() {
        let store = EventStore::in_memory().unwrap();
        let session = SessionId::new();

        store.append(&Event::new(session, EventKind::SessionStart)).unwrap();
        store
            .append(&Event::message(session, Role::User, "hello"))
            .unwrap();
        store
            .append(&Event::tool_call(session, "cat_file", json!({"filePath": "a.txt"})))
            .unwrap();

        let events = store.load_events(session, None).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0].kind, EventKind::SessionStart));
        assert!(matches!(
            &events[1].kind,
            EventKind::Message { role: Role::User, content } if content == "hello"
        ));
    }

    #[test]
    fn kind_filter_selects_one_kind() {
        let store = EventStore::in_memory().unwrap();
        let session = SessionId::new();

        store
            .append(&Event::message(session, Role::Assistant, "working on it"))
            .unwrap();
        store
            .append(&Event::tool_call(session, "list_directory", json!({"directory": "."})))
            .unwrap();
        store
            .append(&Event::tool_result(session, "list_directory", json!({"entries": []})))
            .unwrap();

        let calls = store.load_events(session, Some("tool_call")).unwrap();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0].kind, EventKind::ToolCall { name, .. } if name == "list_directory"));
    }

    #[test]
    fn sessions_are_isolated() {
        let store = EventStore::in_memory().unwrap();
        let a = SessionId::new();
        let b = SessionId::new();

        store.append(&Event::message(a, Role::User, "in a")).unwrap();
        store.append(&Event::message(b, Role::User, "in b")).unwrap();

        let events = store.load_events(a, None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].session_id, a);
    }

    #[test]
    fn list_sessions_counts_messages() {
        let store = EventStore::in_memory().unwrap();
        let session = SessionId::new();

        store.append(&Event::new(session, EventKind::SessionStart)).unwrap();
        store.append(&Event::message(session, Role::User, "one")).unwrap();
        store
            .append(&Event::message(session, Role::Assistant, "two"))
            .unwrap();

        let sessions = store.list_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, session);
        assert_eq!(sessions[0].message_count, 2);
        assert!(sessions[0].ended_at.is_none());

        store.append(&Event::new(session, EventKind::SessionEnd)).unwrap();
        let sessions = store.list_sessions().unwrap();
        assert!(sessions[0].ended_at.is_some());
    }

    #[test]
    fn prefix_lookup_finds_unique_session() {
        let store = EventStore::in_memory().unwrap();
        let session = SessionId::new();
        store.append(&Event::new(session, EventKind::SessionStart)).unwrap();

        let full = session.to_string();
        assert_eq!(store.find_session(&full[..8]).unwrap(), session);

        let err = store.find_session("zzzzzzzz").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        // The lookup message is the whole error text.
        assert_eq!(err.to_string(), "no session matching zzzzzzzz");
    }
}
