//! Records persisted for each conversation.
use std::fmt;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(FromSqlError::Other(
                format!("Unknown message role: {}", other).into(),
            )),
        }
    }
}

/// Rating left on a message, at most one per message.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Feedback {
    pub rating: i64,
    pub comment: Option<String>,
}

/// A message as returned in a session's history
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct HistoryMessage {
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

/// Whether submitting feedback created a new row or replaced the
/// existing one. Both carry the feedback row ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Created(i64),
    Updated(i64),
}

impl FeedbackOutcome {
    pub fn id(&self) -> i64 {
        match self {
            FeedbackOutcome::Created(id) | FeedbackOutcome::Updated(id) => *id,
        }
    }
}

/// Result of a successful chat turn
#[derive(Clone, Debug, PartialEq)]
pub struct ChatReply {
    pub response: String,
    /// ID of the persisted assistant message, used to attach feedback
    pub message_id: i64,
}
