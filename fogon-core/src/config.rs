// File: fogon-core/src/config.rs

use serde::Deserialize;

/// Tunables for one chat session.
///
/// Defaults match the production behavior: a 50-message history page, a 3 s
/// typing staleness window, and a 1 s presence tick.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// How many messages the initial history load fetches.
    pub history_limit: usize,
    /// Age in milliseconds after which a typing heartbeat no longer counts
    /// as evidence of active composition.
    pub typing_stale_ms: i64,
    /// Period in milliseconds of the presence recompute tick that catches
    /// passive expiry when no heartbeat write occurs.
    pub presence_tick_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            typing_stale_ms: 3000,
            presence_tick_ms: 1000,
        }
    }
}

impl ChatConfig {
    pub fn stale_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.typing_stale_ms)
    }

    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.presence_tick_ms)
    }
}
