//! src/services/chat_session.rs
//!
//! Stateful facade over one chat session. Owns the reconciled message log,
//! the loading/sending flags, and the typing presence set; publishes a
//! read-only snapshot over a watch channel after every mutation, and owns
//! the lifecycle of the two store subscriptions.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::error;
use uuid::Uuid;

use fogon_common::Error;
use fogon_common::models::ChatMessage;

use crate::cache::MessageLog;
use crate::config::ChatConfig;
use crate::feed::Subscription;

use super::live_feed::LiveMessageFeed;
use super::message_service::MessageService;
use super::typing_service::{TypingAnnouncer, TypingPresenceTracker};

/// Read model handed to the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    pub messages: Vec<ChatMessage>,
    pub loading: bool,
    pub sending: bool,
    pub typing_handles: Vec<String>,
}

struct SessionState {
    log: MessageLog,
    loading: bool,
    sending: bool,
    typing_handles: Vec<String>,
}

impl SessionState {
    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.log.messages().to_vec(),
            loading: self.loading,
            sending: self.sending,
            typing_handles: self.typing_handles.clone(),
        }
    }
}

pub struct ChatSession {
    messages: MessageService,
    live: LiveMessageFeed,
    announcer: TypingAnnouncer,
    presence: TypingPresenceTracker,
    config: ChatConfig,
    state: Arc<Mutex<SessionState>>,
    snapshot_tx: watch::Sender<ChatSnapshot>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ChatSession {
    /// Collaborators are constructed by the caller and injected here; the
    /// session holds no process-wide state.
    pub fn new(
        messages: MessageService,
        live: LiveMessageFeed,
        announcer: TypingAnnouncer,
        presence: TypingPresenceTracker,
        config: ChatConfig,
    ) -> Self {
        let state = SessionState {
            log: MessageLog::new(),
            loading: true,
            sending: false,
            typing_handles: Vec::new(),
        };
        let (snapshot_tx, _) = watch::channel(state.snapshot());
        Self {
            messages,
            live,
            announcer,
            presence,
            config,
            state: Arc::new(Mutex::new(state)),
            snapshot_tx,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Observes the session's read model. A new value is published after
    /// every state change.
    pub fn watch_state(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// The current read model.
    pub fn snapshot(&self) -> ChatSnapshot {
        self.state.lock().snapshot()
    }

    /// Boots the session: loads and merges history, then opens the live
    /// message and typing presence subscriptions. A failed subscription open
    /// is logged and absorbed — the session keeps serving whatever history it
    /// has. Call once per session; calling it again on a started instance is
    /// not guarded.
    pub async fn start(&self) {
        self.reload().await;

        let state = Arc::clone(&self.state);
        let tx = self.snapshot_tx.clone();
        let live_sub = self
            .live
            .subscribe(move |message| {
                let mut state = state.lock();
                if state.log.apply_live(message) {
                    tx.send_replace(state.snapshot());
                }
            })
            .await;
        match live_sub {
            Ok(sub) => self.subscriptions.lock().push(sub),
            Err(e) => error!("live message subscription failed: {e}"),
        }

        let state = Arc::clone(&self.state);
        let tx = self.snapshot_tx.clone();
        let presence_sub = self
            .presence
            .subscribe(move |handles| {
                let mut state = state.lock();
                state.typing_handles = handles;
                tx.send_replace(state.snapshot());
            })
            .await;
        match presence_sub {
            Ok(sub) => self.subscriptions.lock().push(sub),
            Err(e) => error!("typing presence subscription failed: {e}"),
        }
    }

    /// Re-runs the history load and replaces the reconciled sequence with
    /// the fresh snapshot.
    pub async fn reload(&self) {
        {
            self.state.lock().loading = true;
        }
        self.publish();

        let history = self.messages.load_history(self.config.history_limit).await;
        {
            let mut state = self.state.lock();
            state.log.replace_all(history);
            state.loading = false;
        }
        self.publish();
    }

    /// Sends a message. Fails fast on blank input, and while an earlier send
    /// is still in flight (rapid double-submit protection). The sent message
    /// reaches the log through the live feed echo, deduplicated by
    /// identifier. On failure, restoring the composer text is the caller's
    /// contract.
    pub async fn send(&self, body: &str) -> Result<(), Error> {
        if body.trim().is_empty() {
            return Err(Error::Validation("message is empty".to_string()));
        }
        {
            let mut state = self.state.lock();
            if state.sending {
                return Err(Error::SendInFlight);
            }
            state.sending = true;
        }
        self.publish();

        let result = self.messages.send(body).await;

        self.state.lock().sending = false;
        self.publish();
        result
    }

    /// Deletes a message. On success the entry is removed from local state
    /// immediately; there is no re-fetch.
    pub async fn delete(&self, message_id: Uuid) -> Result<(), Error> {
        self.messages.delete(message_id).await?;
        self.state.lock().log.remove(message_id);
        self.publish();
        Ok(())
    }

    /// Announces that the local user is composing.
    pub async fn notify_typing(&self) {
        self.announcer.announce().await;
    }

    /// Tears down both subscriptions. Idempotent. Once this returns, no new
    /// feed callback will start; a callback already executing may finish.
    pub fn stop(&self) {
        for subscription in self.subscriptions.lock().drain(..) {
            subscription.unsubscribe();
        }
    }

    fn publish(&self) {
        let snapshot = self.state.lock().snapshot();
        self.snapshot_tx.send_replace(snapshot);
    }
}
