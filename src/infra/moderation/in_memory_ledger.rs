// In-memory implementation of OffenderLedger.
//
// Counts are lost when the process exits. Use `SqliteOffenderLedger` when
// they need to survive a restart; the orchestrator doesn't care which one
// it gets.

use crate::core::moderation::{ModerationError, OffenderLedger};
use async_trait::async_trait;
use dashmap::DashMap;

/// Per-user violation counts.
///
/// DashMap's `entry()` locks the shard holding the key, so the
/// read-add-store in `increment` happens as one step even when several
/// messages from the same user are handled at once.
pub struct InMemoryOffenderLedger {
    /// user_id -> violation count
    counts: DashMap<u64, u32>,
}

impl InMemoryOffenderLedger {
    pub fn new() -> Self {
        Self {
            counts: DashMap::new(),
        }
    }
}

impl Default for InMemoryOffenderLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OffenderLedger for InMemoryOffenderLedger {
    async fn increment(&self, user_id: u64) -> Result<u32, ModerationError> {
        let mut count = self.counts.entry(user_id).or_insert(0);
        *count = count.saturating_add(1);
        Ok(*count)
    }

    async fn current_count(&self, user_id: u64) -> Result<u32, ModerationError> {
        Ok(self.counts.get(&user_id).map(|entry| *entry).unwrap_or(0))
    }
}
