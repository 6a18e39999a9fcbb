//! Database connection and schema management
use std::fs;
use std::path::Path;

use anyhow::{Error, Result};
use rusqlite::Connection as SyncConnection;
use tokio_rusqlite::Connection;

const DB_FILE_NAME: &str = "tutor.sqlite3";

/// Open an async connection to the database stored in the directory
/// `db_path`, creating the directory if needed.
pub async fn async_db(db_path: &str) -> Result<Connection, Error> {
    fs::create_dir_all(db_path)?;
    let file = Path::new(db_path).join(DB_FILE_NAME);
    let db = Connection::open(file).await?;
    db.call(|conn| {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    })
    .await?;
    Ok(db)
}

/// Create all tables and indices. Safe to run more than once.
pub fn initialize_db(conn: &mut SyncConnection) -> Result<(), rusqlite::Error> {
    // All or nothing so a half created schema is never left behind
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS chat (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            title TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now'))
        );
        CREATE INDEX IF NOT EXISTS chat_session_id_idx ON chat(session_id);

        CREATE TABLE IF NOT EXISTS message (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chat_id INTEGER NOT NULL REFERENCES chat(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now'))
        );
        CREATE INDEX IF NOT EXISTS message_chat_id_idx ON message(chat_id);

        CREATE TABLE IF NOT EXISTS feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            message_id INTEGER NOT NULL UNIQUE REFERENCES message(id) ON DELETE CASCADE,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            comment TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now'))
        );
        "#,
    )?;
    tx.commit()?;
    Ok(())
}
