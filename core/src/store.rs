//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods; nothing else executes SQL.

use crate::{
    error::GameResult,
    event::EventLogEntry,
};
use rusqlite::{params, Connection, OptionalExtension};

const SAVE_SLOT: i64 = 1;

/// The persisted save slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedGame {
    pub format_version: u32,
    pub state_json:     String,
    /// RFC 3339 wall-clock time of the save.
    pub saved_at:       String,
}

pub struct GameStore {
    conn: Connection,
}

impl GameStore {
    /// Open (or create) the game database at `path`.
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GameResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(&self, session_id: &str, seed: u64, version: &str) -> GameResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO session (session_id, seed, version, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, seed as i64, version, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn session_seed(&self, session_id: &str) -> GameResult<Option<u64>> {
        let seed = self
            .conn
            .query_row(
                "SELECT seed FROM session WHERE session_id = ?1",
                params![session_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(seed.map(|s| s as u64))
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, generation, day, at_ms, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.session_id,
                entry.generation,
                entry.day,
                entry.at_ms as i64,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    /// Every logged event of a session, in emission order.
    pub fn events_for_session(&self, session_id: &str) -> GameResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, generation, day, at_ms, event_type, payload
             FROM event_log WHERE session_id = ?1
             ORDER BY id ASC"
        )?;
        let entries = stmt.query_map(params![session_id], |row| {
            Ok(EventLogEntry {
                id:         Some(row.get(0)?),
                session_id: row.get(1)?,
                generation: row.get(2)?,
                day:        row.get(3)?,
                at_ms:      row.get::<_, i64>(4)? as u64,
                event_type: row.get(5)?,
                payload:    row.get(6)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, session_id: &str, event_type: &str) -> GameResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE session_id = ?1 AND event_type = ?2",
            params![session_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Save slot ──────────────────────────────────────────────

    /// Overwrite the save slot.
    pub fn save_state(&self, state_json: &str, format_version: u32) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO save_slot (slot, format_version, state_json, saved_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (slot) DO UPDATE SET
                 format_version = excluded.format_version,
                 state_json     = excluded.state_json,
                 saved_at       = excluded.saved_at",
            params![SAVE_SLOT, format_version, state_json, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn load_state(&self) -> GameResult<Option<SavedGame>> {
        let saved = self
            .conn
            .query_row(
                "SELECT format_version, state_json, saved_at FROM save_slot WHERE slot = ?1",
                params![SAVE_SLOT],
                |row| {
                    Ok(SavedGame {
                        format_version: row.get(0)?,
                        state_json:     row.get(1)?,
                        saved_at:       row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(saved)
    }

    pub fn clear_save(&self) -> GameResult<()> {
        self.conn.execute("DELETE FROM save_slot WHERE slot = ?1", params![SAVE_SLOT])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GameStore {
        let store = GameStore::in_memory().expect("in-memory store");
        store.migrate().expect("migration");
        store
    }

    #[test]
    fn save_slot_is_overwritten_not_appended() {
        let store = store();
        assert!(store.load_state().expect("load").is_none());

        store.save_state(r#"{"day":1}"#, 1).expect("first save");
        store.save_state(r#"{"day":2}"#, 1).expect("second save");

        let saved = store.load_state().expect("load").expect("slot present");
        assert_eq!(saved.state_json, r#"{"day":2}"#);
        assert_eq!(saved.format_version, 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&saved.saved_at).is_ok());

        store.clear_save().expect("clear");
        assert!(store.load_state().expect("load").is_none());
    }

    #[test]
    fn migrate_twice_is_harmless() {
        let store = store();
        store.migrate().expect("second migration");
        store.insert_session("s-1", 9, "test").expect("session");
        store.insert_session("s-1", 9, "test").expect("duplicate session ignored");
        assert_eq!(store.session_seed("s-1").expect("seed"), Some(9));
        assert_eq!(store.session_seed("missing").expect("seed"), None);
    }
}
