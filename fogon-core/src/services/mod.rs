// File: fogon-core/src/services/mod.rs
pub mod chat_session;
pub mod live_feed;
pub mod message_service;
pub mod typing_service;

pub use chat_session::{ChatSession, ChatSnapshot};
pub use live_feed::LiveMessageFeed;
pub use message_service::MessageService;
pub use typing_service::{TypingAnnouncer, TypingPresenceTracker};
