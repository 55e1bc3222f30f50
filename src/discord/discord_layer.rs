// Discord layer - event handlers and the serenity side of moderation.

#[path = "moderation/mod.rs"]
pub mod moderation;

use crate::core::moderation::{ModerationService, OffenderLedger};
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// The ledger is picked at startup (in-memory or SQLite), so the service
/// holds it behind a trait object.
pub type SharedModeration = Arc<ModerationService<Box<dyn OffenderLedger>>>;

/// State shared with every event handler.
pub struct Data {
    pub moderation: SharedModeration,
}
