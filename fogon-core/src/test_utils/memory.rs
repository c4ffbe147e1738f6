//! src/test_utils/memory.rs
//!
//! In-memory store implementing every boundary trait. Writes echo back over
//! the registered feeds the way the real store's realtime channel does:
//! message inserts land on the insert feed, heartbeat upserts land on the
//! typing change feed. Failure-injection switches cover the degraded paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use fogon_common::Error;
use fogon_common::models::{
    AuthorInfo, ChangeKind, ChatMessage, ConnectionStatus, FeedEvent, MESSAGES_TABLE,
    MessageInsert, TYPING_TABLE, TypingAuthor,
};
use fogon_common::traits::{AuthProvider, ChangeFeed, MessageRepository, TypingRepository};

const FEED_BUFFER: usize = 64;

#[derive(Default)]
pub struct MemoryStore {
    current_user: Mutex<Option<Uuid>>,
    authors: DashMap<Uuid, AuthorInfo>,
    messages: Mutex<Vec<ChatMessage>>,
    heartbeats: DashMap<Uuid, DateTime<Utc>>,
    insert_subs: Mutex<Vec<mpsc::Sender<FeedEvent<MessageInsert>>>>,
    change_subs: Mutex<Vec<mpsc::Sender<FeedEvent<ChangeKind>>>>,
    fail_reads: AtomicBool,
    fail_lookups: AtomicBool,
    fail_writes: AtomicBool,
    insert_delay: Mutex<Option<Duration>>,
    insert_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- seeding -----

    pub fn add_author(&self, handle: &str, role: &str) -> Uuid {
        let author_id = Uuid::new_v4();
        self.authors.insert(
            author_id,
            AuthorInfo {
                handle: handle.to_string(),
                role: role.to_string(),
            },
        );
        author_id
    }

    pub fn set_current_user(&self, author_id: Option<Uuid>) {
        *self.current_user.lock() = author_id;
    }

    /// Inserts a message directly, without echoing a feed event. For
    /// pre-populating history.
    pub fn seed_message(&self, author_id: Uuid, body: &str, at: DateTime<Utc>) -> Uuid {
        let message_id = Uuid::new_v4();
        self.messages.lock().push(ChatMessage {
            message_id,
            body: body.to_string(),
            author_id,
            author: self.author_info(author_id),
            created_at: at,
        });
        message_id
    }

    /// Writes a heartbeat row directly, without echoing a change event. For
    /// pure query tests.
    pub fn seed_heartbeat(&self, author_id: Uuid, at: DateTime<Utc>) {
        self.heartbeats.insert(author_id, at);
    }

    // ----- failure injection -----

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every `insert_message` call stall before completing, to hold a
    /// send in flight.
    pub fn set_insert_delay(&self, delay: Option<Duration>) {
        *self.insert_delay.lock() = delay;
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().len()
    }

    // ----- direct feed emission -----

    /// Pushes a raw insert event to every insert subscriber, as the
    /// transport would on a replayed or out-of-band row.
    pub async fn emit_insert(&self, insert: MessageInsert) {
        let senders = self.insert_subs.lock().clone();
        for sender in senders {
            let _ = sender.send(FeedEvent::Data(insert.clone())).await;
        }
    }

    pub async fn emit_change(&self, kind: ChangeKind) {
        let senders = self.change_subs.lock().clone();
        for sender in senders {
            let _ = sender.send(FeedEvent::Data(kind)).await;
        }
    }

    /// Reports a transport status transition on both feeds.
    pub async fn emit_status(&self, status: ConnectionStatus) {
        let insert_senders = self.insert_subs.lock().clone();
        for sender in insert_senders {
            let _ = sender.send(FeedEvent::Status(status.clone())).await;
        }
        let change_senders = self.change_subs.lock().clone();
        for sender in change_senders {
            let _ = sender.send(FeedEvent::Status(status.clone())).await;
        }
    }

    fn author_info(&self, author_id: Uuid) -> AuthorInfo {
        self.authors
            .get(&author_id)
            .map(|entry| entry.clone())
            .unwrap_or_else(AuthorInfo::unknown)
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ChatMessage>, Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::StoreRead("message query failed".to_string()));
        }
        let mut page = self.messages.lock().clone();
        // Newest first. Stable ascending sort then reverse, so that equal
        // timestamps come back latest-inserted first and a reversing reader
        // recovers insertion order.
        page.sort_by_key(|m| m.created_at);
        page.reverse();
        page.truncate(limit);
        Ok(page)
    }

    async fn fetch_by_id(&self, message_id: Uuid) -> Result<ChatMessage, Error> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::StoreRead("message lookup failed".to_string()));
        }
        self.messages
            .lock()
            .iter()
            .find(|m| m.message_id == message_id)
            .cloned()
            .ok_or_else(|| Error::StoreRead(format!("no message with id {message_id}")))
    }

    async fn insert_message(&self, body: &str, author_id: Uuid) -> Result<(), Error> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.insert_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::StoreWrite("message insert rejected".to_string()));
        }

        let message = ChatMessage {
            message_id: Uuid::new_v4(),
            body: body.to_string(),
            author_id,
            author: self.author_info(author_id),
            created_at: Utc::now(),
        };
        let insert = MessageInsert {
            message_id: message.message_id,
            body: message.body.clone(),
            author_id,
            created_at: message.created_at,
        };
        self.messages.lock().push(message);
        self.emit_insert(insert).await;
        Ok(())
    }

    async fn delete_message(&self, message_id: Uuid) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::StoreWrite("message delete rejected".to_string()));
        }
        let mut messages = self.messages.lock();
        let before = messages.len();
        messages.retain(|m| m.message_id != message_id);
        if messages.len() == before {
            return Err(Error::StoreWrite(format!("no message with id {message_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl TypingRepository for MemoryStore {
    async fn upsert_heartbeat(&self, author_id: Uuid, at: DateTime<Utc>) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::StoreWrite("heartbeat upsert rejected".to_string()));
        }
        let existed = self.heartbeats.insert(author_id, at).is_some();
        self.emit_change(if existed {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        })
        .await;
        Ok(())
    }

    async fn query_heartbeats(&self, newer_than: DateTime<Utc>) -> Result<Vec<TypingAuthor>, Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::StoreRead("heartbeat query failed".to_string()));
        }
        let mut rows: Vec<(DateTime<Utc>, TypingAuthor)> = self
            .heartbeats
            .iter()
            .filter(|entry| *entry.value() > newer_than)
            .map(|entry| {
                // Join miss yields an empty handle, like a null join column.
                let handle = self
                    .authors
                    .get(entry.key())
                    .map(|a| a.handle.clone())
                    .unwrap_or_default();
                (
                    *entry.value(),
                    TypingAuthor {
                        author_id: *entry.key(),
                        handle,
                    },
                )
            })
            .collect();
        // Map iteration order is arbitrary; return oldest announcement first
        // so query order is deterministic.
        rows.sort_by_key(|(at, _)| *at);
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }
}

#[async_trait]
impl ChangeFeed for MemoryStore {
    async fn subscribe_inserts(
        &self,
        table: &str,
    ) -> Result<mpsc::Receiver<FeedEvent<MessageInsert>>, Error> {
        if table != MESSAGES_TABLE {
            return Err(Error::Subscription(format!("unknown table: {table}")));
        }
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let _ = tx.send(FeedEvent::Status(ConnectionStatus::Connected)).await;
        self.insert_subs.lock().push(tx);
        Ok(rx)
    }

    async fn subscribe_changes(
        &self,
        table: &str,
    ) -> Result<mpsc::Receiver<FeedEvent<ChangeKind>>, Error> {
        if table != TYPING_TABLE {
            return Err(Error::Subscription(format!("unknown table: {table}")));
        }
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let _ = tx.send(FeedEvent::Status(ConnectionStatus::Connected)).await;
        self.change_subs.lock().push(tx);
        Ok(rx)
    }
}

#[async_trait]
impl AuthProvider for MemoryStore {
    async fn current_user_id(&self) -> Result<Option<Uuid>, Error> {
        Ok(*self.current_user.lock())
    }
}
