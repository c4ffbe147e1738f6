// File: fogon-common/src/models/chat.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Placeholder handle used when author enrichment fails on a live event.
pub const UNKNOWN_HANDLE: &str = "unknown@user";

/// Role tag assigned when the store has no role for an author.
pub const DEFAULT_ROLE: &str = "member";

/// Display attributes of a message author, joined from the user table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub handle: String,
    pub role: String,
}

impl AuthorInfo {
    /// The sentinel author used for degraded records.
    pub fn unknown() -> Self {
        Self {
            handle: UNKNOWN_HANDLE.to_string(),
            role: DEFAULT_ROLE.to_string(),
        }
    }
}

/// A fully-joined chat message. Immutable once created; removed only by an
/// explicit delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: Uuid,
    pub body: String,
    pub author_id: Uuid,
    pub author: AuthorInfo,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Builds a fallback message from a raw insert payload when the joined
    /// record cannot be fetched. A degraded record is always preferable to
    /// dropping the event.
    pub fn degraded(insert: &MessageInsert) -> Self {
        Self {
            message_id: insert.message_id,
            body: insert.body.clone(),
            author_id: insert.author_id,
            author: AuthorInfo::unknown(),
            created_at: insert.created_at,
        }
    }
}

/// Raw payload of a message-insert event. Carries only the columns present
/// on the inserted row; the author join happens in a follow-up fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInsert {
    pub message_id: Uuid,
    pub body: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl MessageInsert {
    /// Decodes a raw row object as delivered by a Postgres-changes style
    /// transport.
    pub fn from_row_json(row: serde_json::Value) -> Result<Self, Error> {
        Ok(serde_json::from_value(row)?)
    }
}
