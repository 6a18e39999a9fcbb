use anyhow::{Error, Result};
use rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

use super::models::{Feedback, FeedbackOutcome, HistoryMessage, Role};

/// Insert a new chat record for the session and return its ID. Old
/// chats for the same session are left untouched.
pub async fn create_chat(db: &Connection, session_id: &str) -> Result<i64, Error> {
    let s_id = session_id.to_owned();
    let chat_id = db
        .call(move |conn| {
            conn.execute("INSERT INTO chat (session_id) VALUES (?)", [s_id])?;
            Ok(conn.last_insert_rowid())
        })
        .await?;
    Ok(chat_id)
}

/// The most recently created chat for a session, if any.
pub async fn find_latest_chat_id(db: &Connection, session_id: &str) -> Result<Option<i64>, Error> {
    let s_id = session_id.to_owned();
    let chat_id = db
        .call(move |conn| {
            let id = conn
                .query_row(
                    "SELECT id FROM chat WHERE session_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
                    [s_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
        .await?;
    Ok(chat_id)
}

pub async fn insert_message(
    db: &Connection,
    chat_id: i64,
    role: Role,
    content: &str,
) -> Result<i64, Error> {
    let content = content.to_owned();
    let message_id = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO message (chat_id, role, content) VALUES (?, ?, ?)",
                params![chat_id, role, content],
            )?;
            let message_id = tx.last_insert_rowid();
            tx.execute(
                "UPDATE chat SET updated_at = strftime('%Y-%m-%dT%H:%M:%f', 'now') WHERE id = ?",
                [chat_id],
            )?;
            tx.commit()?;
            Ok(message_id)
        })
        .await?;
    Ok(message_id)
}

/// Create or replace the feedback for a message. Returns `None` if
/// the message doesn't exist.
pub async fn upsert_feedback(
    db: &Connection,
    message_id: i64,
    rating: i64,
    comment: Option<String>,
) -> Result<Option<FeedbackOutcome>, Error> {
    let outcome = db
        .call(move |conn| {
            // Checking for the message and the existing feedback must
            // happen atomically with the write
            let tx = conn.transaction()?;

            let message_exists = tx
                .query_row("SELECT 1 FROM message WHERE id = ?", [message_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !message_exists {
                return Ok(None);
            }

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM feedback WHERE message_id = ?",
                    [message_id],
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = match existing {
                Some(feedback_id) => {
                    tx.execute(
                        "UPDATE feedback SET rating = ?, comment = ? WHERE id = ?",
                        params![rating, comment, feedback_id],
                    )?;
                    FeedbackOutcome::Updated(feedback_id)
                }
                None => {
                    tx.execute(
                        "INSERT INTO feedback (message_id, rating, comment) VALUES (?, ?, ?)",
                        params![message_id, rating, comment],
                    )?;
                    FeedbackOutcome::Created(tx.last_insert_rowid())
                }
            };

            tx.commit()?;
            Ok(Some(outcome))
        })
        .await?;
    Ok(outcome)
}

pub async fn find_messages_by_chat_id(
    db: &Connection,
    chat_id: i64,
) -> Result<Vec<HistoryMessage>, Error> {
    let messages = db
        .call(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT m.id, m.role, m.content, m.timestamp, f.rating, f.comment
                FROM message m
                LEFT JOIN feedback f ON f.message_id = m.id
                WHERE m.chat_id = ?
                ORDER BY m.timestamp ASC, m.id ASC
                "#,
            )?;
            let rows = stmt
                .query_map([chat_id], |row| {
                    let rating: Option<i64> = row.get(4)?;
                    let comment: Option<String> = row.get(5)?;
                    Ok(HistoryMessage {
                        id: row.get(0)?,
                        role: row.get(1)?,
                        content: row.get(2)?,
                        timestamp: row.get(3)?,
                        feedback: rating.map(|rating| Feedback { rating, comment }),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?;
    Ok(messages)
}

/// Messages of the most recent chat for a session, oldest first.
pub async fn find_history_by_session_id(
    db: &Connection,
    session_id: &str,
) -> Result<Vec<HistoryMessage>, Error> {
    match find_latest_chat_id(db, session_id).await? {
        Some(chat_id) => find_messages_by_chat_id(db, chat_id).await,
        None => Ok(vec![]),
    }
}
