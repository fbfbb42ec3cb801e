//! Session persistence.
//!
//! Two backends behind one trait: an in-memory map for tests and one-shot
//! runs, and a SQLite database for sessions that survive the process. The
//! SQLite store keeps the whole state as one JSON column; sessions are small
//! and always loaded whole, so there is nothing to index beyond the id.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};

use crate::error::{RedraftError, Result};
use crate::session::SessionState;

/// Store for refine-loop sessions.
pub trait SessionStore: Send + Sync {
    /// Persist a new session. Fails if the id already exists.
    fn create(&self, state: &SessionState) -> Result<()>;

    /// Load a session by id.
    fn get(&self, id: &str) -> Result<Option<SessionState>>;

    /// Persist the current state of an existing session.
    fn save(&self, state: &SessionState) -> Result<()>;

    /// Delete a session by id.
    fn delete(&self, id: &str) -> Result<()>;

    /// List all stored session ids, most recently updated first.
    fn list(&self) -> Result<Vec<String>>;
}

/// Volatile store backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, state: &SessionState) -> Result<()> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        if sessions.contains_key(&state.id) {
            return Err(RedraftError::Storage(format!("session already exists: {}", state.id)));
        }
        sessions.insert(state.id.clone(), state.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<SessionState>> {
        let sessions = self.sessions.lock().expect("session map poisoned");
        Ok(sessions.get(id).cloned())
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        if !sessions.contains_key(&state.id) {
            return Err(RedraftError::SessionNotFound(state.id.clone()));
        }
        sessions.insert(state.id.clone(), state.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        sessions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RedraftError::SessionNotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let sessions = self.sessions.lock().expect("session map poisoned");
        let mut entries: Vec<(&String, i64)> =
            sessions.iter().map(|(id, s)| (id, s.updated_at)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(entries.into_iter().map(|(id, _)| id.clone()).collect())
    }
}

/// Durable store backed by SQLite.
pub struct SqliteSessionStore {
    db: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open or create a store at the given database path.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Connection::open(db_path)?;
        Self::init_schema(&db)?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// Open an in-memory database. Useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()?;
        Self::init_schema(&db)?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions(updated_at);
            "#,
        )?;
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn create(&self, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        let db = self.db.lock().expect("sqlite connection poisoned");
        let inserted = db.execute(
            "INSERT OR IGNORE INTO sessions (id, state, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![state.id, json, state.created_at, state.updated_at],
        )?;
        if inserted == 0 {
            return Err(RedraftError::Storage(format!("session already exists: {}", state.id)));
        }
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<SessionState>> {
        let db = self.db.lock().expect("sqlite connection poisoned");
        let mut stmt = db.prepare("SELECT state FROM sessions WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => {
                let json: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        let db = self.db.lock().expect("sqlite connection poisoned");
        let updated = db.execute(
            "UPDATE sessions SET state = ?2, updated_at = ?3 WHERE id = ?1",
            params![state.id, json, state.updated_at],
        )?;
        if updated == 0 {
            return Err(RedraftError::SessionNotFound(state.id.clone()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let db = self.db.lock().expect("sqlite connection poisoned");
        let deleted = db.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(RedraftError::SessionNotFound(id.to_string()));
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let db = self.db.lock().expect("sqlite connection poisoned");
        let mut stmt = db.prepare("SELECT id FROM sessions ORDER BY updated_at DESC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
