//! src/services/live_feed.rs
//!
//! Live message-insert subscription. Raw insert payloads carry no author
//! join, so each event is re-fetched by identifier before delivery; when the
//! lookup fails the event is delivered as a degraded record rather than
//! dropped.

use std::sync::Arc;

use tracing::{info, warn};

use fogon_common::Error;
use fogon_common::models::{ChatMessage, FeedEvent, MESSAGES_TABLE};
use fogon_common::traits::{ChangeFeed, MessageRepository};

use crate::feed::Subscription;

pub struct LiveMessageFeed {
    repo: Arc<dyn MessageRepository>,
    feed: Arc<dyn ChangeFeed>,
}

impl LiveMessageFeed {
    pub fn new(repo: Arc<dyn MessageRepository>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self { repo, feed }
    }

    /// Opens one subscription to message-insert events. Every received
    /// insert produces exactly one `on_message` call; status transitions are
    /// logged and otherwise ignored (the transport owns reconnection).
    pub async fn subscribe<F>(&self, mut on_message: F) -> Result<Subscription, Error>
    where
        F: FnMut(ChatMessage) + Send + 'static,
    {
        let mut inserts = self.feed.subscribe_inserts(MESSAGES_TABLE).await?;
        let (subscription, mut shutdown_rx) = Subscription::channel();
        let repo = Arc::clone(&self.repo);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    event = inserts.recv() => match event {
                        Some(FeedEvent::Data(insert)) => {
                            let message = match repo.fetch_by_id(insert.message_id).await {
                                Ok(full) => full,
                                Err(e) => {
                                    warn!(
                                        message_id = %insert.message_id,
                                        "author enrichment failed, delivering degraded record: {e}"
                                    );
                                    ChatMessage::degraded(&insert)
                                }
                            };
                            if *shutdown_rx.borrow() {
                                break;
                            }
                            on_message(message);
                        }
                        Some(FeedEvent::Status(status)) => {
                            info!(?status, "message feed status changed");
                        }
                        None => {
                            warn!("message insert feed closed");
                            break;
                        }
                    },
                }
            }
        });

        Ok(subscription)
    }
}
