// File: fogon-core/src/cache/message_log.rs

use std::collections::HashSet;

use fogon_common::models::ChatMessage;
use uuid::Uuid;

/// The reconciled message sequence: deduplicated by identifier, ordered
/// oldest to newest.
///
/// Live inserts are appended without re-sorting. The insert feed is expected
/// to deliver events in non-decreasing `created_at` order; callers that
/// cannot guarantee that precondition would need a sorting layer in front of
/// this log.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
    seen: HashSet<Uuid>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole sequence with a freshly-loaded history snapshot
    /// (already ordered oldest first).
    pub fn replace_all(&mut self, snapshot: Vec<ChatMessage>) {
        self.seen = snapshot.iter().map(|m| m.message_id).collect();
        self.messages = snapshot;
    }

    /// Appends a live message. Returns `false` and leaves the sequence
    /// untouched when the identifier is already present — a send echoing
    /// back to its own sender, or a replayed delivery.
    pub fn apply_live(&mut self, message: ChatMessage) -> bool {
        if !self.seen.insert(message.message_id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Removes a message by identifier. Returns whether anything was
    /// removed.
    pub fn remove(&mut self, message_id: Uuid) -> bool {
        if !self.seen.remove(&message_id) {
            return false;
        }
        self.messages.retain(|m| m.message_id != message_id);
        true
    }

    pub fn contains(&self, message_id: Uuid) -> bool {
        self.seen.contains(&message_id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use fogon_common::models::AuthorInfo;

    fn message(body: &str, age_secs: i64) -> ChatMessage {
        ChatMessage {
            message_id: Uuid::new_v4(),
            body: body.to_string(),
            author_id: Uuid::new_v4(),
            author: AuthorInfo {
                handle: "alice@fogon.app".to_string(),
                role: "member".to_string(),
            },
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn live_messages_append_in_arrival_order() {
        let mut log = MessageLog::new();
        let first = message("first", 20);
        let second = message("second", 10);

        assert!(log.apply_live(first.clone()));
        assert!(log.apply_live(second.clone()));

        assert_eq!(log.len(), 2);
        assert_eq!(log.messages()[0].message_id, first.message_id);
        assert_eq!(log.messages()[1].message_id, second.message_id);
    }

    #[test]
    fn duplicate_identifier_leaves_sequence_unchanged() {
        let mut log = MessageLog::new();
        let original = message("hola", 10);
        assert!(log.apply_live(original.clone()));

        let mut replay = original.clone();
        replay.body = "replayed copy".to_string();
        assert!(!log.apply_live(replay));

        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0], original);
    }

    #[test]
    fn replace_all_resets_dedup_state() {
        let mut log = MessageLog::new();
        let stale = message("stale", 30);
        log.apply_live(stale.clone());

        let snapshot = vec![message("one", 20), message("two", 10)];
        log.replace_all(snapshot.clone());

        assert_eq!(log.messages(), snapshot.as_slice());
        assert!(!log.contains(stale.message_id));
        // The replaced entries dedup against their own snapshot.
        assert!(!log.apply_live(snapshot[0].clone()));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn remove_deletes_by_identifier() {
        let mut log = MessageLog::new();
        let keep = message("keep", 20);
        let doomed = message("doomed", 10);
        log.apply_live(keep.clone());
        log.apply_live(doomed.clone());

        assert!(log.remove(doomed.message_id));
        assert!(!log.remove(doomed.message_id));

        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].message_id, keep.message_id);
        // A removed identifier may be applied again (delete then re-deliver).
        assert!(log.apply_live(doomed));
    }
}
