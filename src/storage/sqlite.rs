//! Room state slots persisted in SQLite.

use super::{DurableStore, StorageChange, CHANGE_CHANNEL_CAPACITY};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Durable store backed by a SQLite database file.
///
/// # Schema
/// ```sql
/// CREATE TABLE room_state (
///     key TEXT PRIMARY KEY,       -- "{prefix}:{room_id}"
///     value TEXT NOT NULL,        -- Encoded workspace snapshot
///     updated_at TEXT NOT NULL    -- ISO 8601 timestamp of the last write
/// );
/// ```
///
/// Change notifications are delivered to subscribers of this instance only;
/// contexts that should see each other's writes share one `SqliteStore`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    changes_tx: broadcast::Sender<StorageChange>,
}

impl SqliteStore {
    /// Creates or opens a store. `":memory:"` gives a private in-memory database.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open database")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS room_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create room_state table")?;

        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            conn: Mutex::new(conn),
            changes_tx,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection mutex poisoned"))
    }

    fn notify(&self, key: &str, new_value: Option<String>, writer: &str) {
        let _ = self.changes_tx.send(StorageChange {
            key: key.to_string(),
            new_value,
            writer: writer.to_string(),
        });
    }
}

impl DurableStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn()?
            .query_row(
                "SELECT value FROM room_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read room state")
    }

    fn set(&self, key: &str, value: &str, writer: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        self.conn()?
            .execute(
                r#"
                INSERT INTO room_state (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![key, value, now],
            )
            .context("Failed to store room state")?;

        self.notify(key, Some(value.to_string()), writer);
        Ok(())
    }

    fn remove(&self, key: &str, writer: &str) -> Result<()> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM room_state WHERE key = ?1", params![key])
            .context("Failed to delete room state")?;

        if rows_affected > 0 {
            self.notify(key, None, writer);
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.changes_tx.subscribe()
    }
}
