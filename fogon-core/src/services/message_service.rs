// File: fogon-core/src/services/message_service.rs

use std::sync::Arc;

use tracing::error;
use uuid::Uuid;

use fogon_common::Error;
use fogon_common::models::ChatMessage;
use fogon_common::traits::{AuthProvider, MessageRepository};

/// Store-facing message operations for one chat surface.
pub struct MessageService {
    repo: Arc<dyn MessageRepository>,
    auth: Arc<dyn AuthProvider>,
}

impl MessageService {
    pub fn new(repo: Arc<dyn MessageRepository>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { repo, auth }
    }

    /// Loads the most recent `limit` messages, oldest first.
    ///
    /// The store returns the page newest first, so it is reversed here. Read
    /// failures are absorbed: the caller gets an empty history and the chat
    /// surface still renders.
    pub async fn load_history(&self, limit: usize) -> Vec<ChatMessage> {
        match self.repo.fetch_recent(limit).await {
            Ok(mut page) => {
                page.reverse();
                page
            }
            Err(e) => {
                error!("failed to load message history: {e}");
                Vec::new()
            }
        }
    }

    /// Inserts a message authored by the current user.
    pub async fn send(&self, body: &str) -> Result<(), Error> {
        let author_id = self
            .auth
            .current_user_id()
            .await?
            .ok_or(Error::NotAuthenticated)?;
        self.repo.insert_message(body, author_id).await
    }

    pub async fn delete(&self, message_id: Uuid) -> Result<(), Error> {
        self.repo.delete_message(message_id).await
    }
}
