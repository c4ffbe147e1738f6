//! src/services/typing_service.rs
//!
//! Typing presence over heartbeat rows: the announcer refreshes the local
//! user's heartbeat on composing activity, the tracker derives the set of
//! currently-typing handles with a sliding staleness window. There is no
//! explicit "stopped typing" write anywhere; absence of announcements lets
//! the heartbeat age out of the query window.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use fogon_common::Error;
use fogon_common::models::{FeedEvent, TYPING_TABLE};
use fogon_common::traits::{AuthProvider, ChangeFeed, TypingRepository};

use crate::config::ChatConfig;
use crate::feed::Subscription;

/// Publishes the local user's typing heartbeat.
pub struct TypingAnnouncer {
    repo: Arc<dyn TypingRepository>,
    auth: Arc<dyn AuthProvider>,
}

impl TypingAnnouncer {
    pub fn new(repo: Arc<dyn TypingRepository>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { repo, auth }
    }

    /// Refreshes the heartbeat at the current timestamp. Callers may invoke
    /// this on every keystroke; the upsert is keyed by author and safe to
    /// issue redundantly. Typing indication is best-effort, so a missing
    /// identity or a rejected write is absorbed here.
    pub async fn announce(&self) {
        let author_id = match self.auth.current_user_id().await {
            Ok(Some(id)) => id,
            Ok(None) => return,
            Err(e) => {
                debug!("typing heartbeat skipped, no identity: {e}");
                return;
            }
        };
        if let Err(e) = self.repo.upsert_heartbeat(author_id, Utc::now()).await {
            debug!("typing heartbeat upsert failed: {e}");
        }
    }
}

/// Derives the live set of currently-typing handles.
pub struct TypingPresenceTracker {
    repo: Arc<dyn TypingRepository>,
    feed: Arc<dyn ChangeFeed>,
    stale_window: chrono::Duration,
    tick_period: std::time::Duration,
}

impl TypingPresenceTracker {
    pub fn new(
        repo: Arc<dyn TypingRepository>,
        feed: Arc<dyn ChangeFeed>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            repo,
            feed,
            stale_window: config.stale_window(),
            tick_period: config.tick_period(),
        }
    }

    /// Opens one subscription to heartbeat changes plus a periodic tick, and
    /// invokes `on_change` with the recomputed presence set on every
    /// trigger. The tick catches passive expiry where no write occurs; both
    /// triggers run the same pure recompute, so racing is harmless. The
    /// interval's immediate first tick delivers the initial presence set
    /// right after subscribing.
    pub async fn subscribe<F>(&self, mut on_change: F) -> Result<Subscription, Error>
    where
        F: FnMut(Vec<String>) + Send + 'static,
    {
        let mut changes = self.feed.subscribe_changes(TYPING_TABLE).await?;
        let (subscription, mut shutdown_rx) = Subscription::channel();
        let repo = Arc::clone(&self.repo);
        let stale_window = self.stale_window;
        let tick_period = self.tick_period;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut feed_open = true;

            loop {
                let recompute = tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    event = changes.recv(), if feed_open => match event {
                        Some(FeedEvent::Data(_)) => true,
                        Some(FeedEvent::Status(status)) => {
                            info!(?status, "typing feed status changed");
                            false
                        }
                        None => {
                            warn!("typing change feed closed, presence is tick-driven from here");
                            feed_open = false;
                            false
                        }
                    },
                    _ = ticker.tick() => true,
                };

                if !recompute {
                    continue;
                }
                let handles = active_typists(repo.as_ref(), stale_window).await;
                if *shutdown_rx.borrow() {
                    break;
                }
                on_change(handles);
            }
        });

        Ok(subscription)
    }
}

/// Queries every heartbeat inside the staleness window and maps the rows to
/// display handles: join misses (empty handles) dropped, duplicates removed,
/// query order preserved. The local user is included like anyone else. A
/// failed query degrades to an empty set.
async fn active_typists(repo: &dyn TypingRepository, stale_window: chrono::Duration) -> Vec<String> {
    let cutoff = Utc::now() - stale_window;
    match repo.query_heartbeats(cutoff).await {
        Ok(rows) => {
            let mut seen = HashSet::new();
            rows.into_iter()
                .map(|row| row.handle)
                .filter(|handle| !handle.is_empty() && seen.insert(handle.clone()))
                .collect()
        }
        Err(e) => {
            error!("presence query failed: {e}");
            Vec::new()
        }
    }
}
