// File: fogon-common/src/models/typing.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the heartbeat presence query: an author whose typing heartbeat
/// is still inside the staleness window, joined to their display handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingAuthor {
    pub author_id: Uuid,
    pub handle: String,
}
