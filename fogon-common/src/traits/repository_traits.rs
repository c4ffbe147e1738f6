// File: fogon-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::Error;
use crate::models::{ChangeKind, ChatMessage, FeedEvent, MessageInsert, TypingAuthor};

/// Store-facing message operations. Implementations wrap whatever backend
/// actually persists messages; the sync core only sees this seam.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Fetches the most recent `limit` messages joined with author
    /// handle/role, **newest first** (the store's natural order).
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ChatMessage>, Error>;

    /// Fetches a single fully-joined message by identifier.
    async fn fetch_by_id(&self, message_id: Uuid) -> Result<ChatMessage, Error>;

    async fn insert_message(&self, body: &str, author_id: Uuid) -> Result<(), Error>;

    async fn delete_message(&self, message_id: Uuid) -> Result<(), Error>;
}

/// Store-facing typing-heartbeat operations. One heartbeat row per author;
/// an upsert refreshes the timestamp and never creates a duplicate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TypingRepository: Send + Sync {
    async fn upsert_heartbeat(&self, author_id: Uuid, at: DateTime<Utc>) -> Result<(), Error>;

    /// Returns every author whose heartbeat is newer than `newer_than`,
    /// joined to their display handle, in query order.
    async fn query_heartbeats(&self, newer_than: DateTime<Utc>) -> Result<Vec<TypingAuthor>, Error>;
}

/// Realtime change streams published by the store transport. Each call opens
/// one independent stream; dropping the receiver tears the channel down.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Subscribes to insert events on `table`.
    async fn subscribe_inserts(
        &self,
        table: &str,
    ) -> Result<mpsc::Receiver<FeedEvent<MessageInsert>>, Error>;

    /// Subscribes to any change (insert/update/delete) on `table`.
    async fn subscribe_changes(
        &self,
        table: &str,
    ) -> Result<mpsc::Receiver<FeedEvent<ChangeKind>>, Error>;
}

/// Resolves the local user identity, if any.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user_id(&self) -> Result<Option<Uuid>, Error>;
}
