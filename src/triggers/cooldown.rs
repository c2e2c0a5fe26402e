//! Anti-spam bookkeeping for nudges.

use std::collections::HashMap;

/// Per-key "last fired" ledger, scoped to one detector pass over one day.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    last_sent: HashMap<String, i64>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` may fire at `now_minute` given `cooldown_minutes`.
    pub fn can_send(&self, key: &str, now_minute: i64, cooldown_minutes: i64) -> bool {
        match self.last_sent.get(key) {
            None => true,
            Some(&last) => now_minute - last >= cooldown_minutes,
        }
    }

    /// Record that `key` fired at `now_minute`.
    pub fn mark_sent(&mut self, key: &str, now_minute: i64) {
        self.last_sent.insert(key.to_string(), now_minute);
    }

    /// Minute `key` last fired, if ever.
    pub fn last_sent(&self, key: &str) -> Option<i64> {
        self.last_sent.get(key).copied()
    }
}
