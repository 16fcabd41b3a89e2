use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::core::serialization::{SessionSave, SAVE_FORMAT_VERSION};
use crate::world::repository::{SnapshotError, SnapshotRepository};

const SNAPSHOT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS snapshot_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  format_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshot_payload (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  saved_week INTEGER NOT NULL,
  payload TEXT NOT NULL
);
"#;

/// Single-snapshot sqlite store: one meta row carrying the format version
/// and one JSON payload row, replaced together in a transaction.
pub struct SnapshotDb {
    conn: Connection,
}

impl SnapshotDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SNAPSHOT_SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, SnapshotError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SNAPSHOT_SCHEMA)?;
        Ok(Self { conn })
    }

    fn stored_version(&self) -> Result<Option<i64>, SnapshotError> {
        let version = self
            .conn
            .query_row(
                "SELECT format_version FROM snapshot_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }
}

impl SnapshotRepository for SnapshotDb {
    fn load(&mut self) -> Result<Option<SessionSave>, SnapshotError> {
        let Some(version) = self.stored_version()? else {
            return Ok(None);
        };
        if version != SAVE_FORMAT_VERSION as i64 {
            // Fail closed: an unknown layout is treated as no snapshot,
            // never partially applied or migrated.
            warn!(
                stored = version,
                expected = SAVE_FORMAT_VERSION,
                "snapshot format version mismatch, ignoring stored session"
            );
            return Ok(None);
        }

        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM snapshot_payload WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let Some(payload) = payload else {
            return Ok(None);
        };
        let save: SessionSave = serde_json::from_str(&payload)?;
        Ok(Some(save))
    }

    fn save(&mut self, save: &SessionSave) -> Result<(), SnapshotError> {
        let payload = serde_json::to_string(save)?;
        let saved_week = save
            .operators
            .first()
            .map(|operator| operator.week as i64)
            .unwrap_or(0);

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO snapshot_meta (id, format_version) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET format_version = excluded.format_version",
            params![SAVE_FORMAT_VERSION as i64],
        )?;
        tx.execute(
            "INSERT INTO snapshot_payload (id, saved_week, payload) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET saved_week = excluded.saved_week,
                                           payload = excluded.payload",
            params![saved_week, payload],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SnapshotError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM snapshot_payload", [])?;
        tx.execute("DELETE FROM snapshot_meta", [])?;
        tx.commit()?;
        Ok(())
    }
}
