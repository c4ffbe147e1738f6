// File: fogon-common/src/models/mod.rs
pub mod chat;
pub mod feed;
pub mod typing;

pub use chat::{AuthorInfo, ChatMessage, MessageInsert, DEFAULT_ROLE, UNKNOWN_HANDLE};
pub use feed::{ChangeKind, ConnectionStatus, FeedEvent, MESSAGES_TABLE, TYPING_TABLE};
pub use typing::TypingAuthor;
