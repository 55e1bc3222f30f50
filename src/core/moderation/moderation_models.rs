// Moderation domain models - data structures for the prohibited-term pipeline.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts serenity messages into `InboundMessage` and
// turns the orchestrator's side-effect requests into API calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sanction severity, ordered from least to most severe.
///
/// The derived `Ord` follows declaration order, so `Ban > Kick > Timeout7d ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SanctionTier {
    None,
    Timeout5m,
    Timeout15m,
    Timeout1d,
    Timeout7d,
    Kick,
    Ban,
}

impl SanctionTier {
    /// Fixed timeout length for the timeout tiers.
    pub fn timeout_duration(&self) -> Option<Duration> {
        match self {
            SanctionTier::Timeout5m => Some(Duration::from_secs(5 * 60)),
            SanctionTier::Timeout15m => Some(Duration::from_secs(15 * 60)),
            SanctionTier::Timeout1d => Some(Duration::from_secs(24 * 60 * 60)),
            SanctionTier::Timeout7d => Some(Duration::from_secs(7 * 24 * 60 * 60)),
            SanctionTier::None | SanctionTier::Kick | SanctionTier::Ban => None,
        }
    }

    /// Kick and ban are severe enough that the admin channel hears about them.
    pub fn is_severe(&self) -> bool {
        matches!(self, SanctionTier::Kick | SanctionTier::Ban)
    }
}

impl std::fmt::Display for SanctionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanctionTier::None => write!(f, "None"),
            SanctionTier::Timeout5m => write!(f, "Timeout (5 minutes)"),
            SanctionTier::Timeout15m => write!(f, "Timeout (15 minutes)"),
            SanctionTier::Timeout1d => write!(f, "Timeout (1 day)"),
            SanctionTier::Timeout7d => write!(f, "Timeout (7 days)"),
            SanctionTier::Kick => write!(f, "Kick"),
            SanctionTier::Ban => write!(f, "Ban"),
        }
    }
}

/// Enough information to delete a message later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: u64,
    pub message_id: u64,
}

/// A message as seen by the moderation core.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// `None` for direct messages
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub message_id: u64,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub text: String,
}

impl InboundMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            channel_id: self.channel_id,
            message_id: self.message_id,
        }
    }
}

/// The auditable record of one violation and the sanction it triggered.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationEvent {
    pub offending_user_id: u64,
    /// Matched terms in configured order.
    pub matched_terms: Vec<String>,
    pub original_text: String,
    pub sanction_tier: SanctionTier,
    /// Cumulative count after this violation, if the ledger answered.
    pub violation_count: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

/// The side-effecting steps of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationStep {
    DeleteMessage,
    WarnUser,
    RecordViolation,
    ApplySanction,
    PublishRecord,
    NotifyAdmins,
}

impl std::fmt::Display for ModerationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationStep::DeleteMessage => write!(f, "delete_message"),
            ModerationStep::WarnUser => write!(f, "warn_user"),
            ModerationStep::RecordViolation => write!(f, "record_violation"),
            ModerationStep::ApplySanction => write!(f, "apply_sanction"),
            ModerationStep::PublishRecord => write!(f, "publish_record"),
            ModerationStep::NotifyAdmins => write!(f, "notify_admins"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    /// Carries the underlying cause
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: ModerationStep,
    pub status: StepStatus,
}

/// Summary of everything `handle` attempted for one violating message.
#[derive(Debug, Clone)]
pub struct ModerationReport {
    pub event: ModerationEvent,
    pub steps: Vec<StepReport>,
}

impl ModerationReport {
    /// Status of a given step, if it was part of this run.
    pub fn status_of(&self, step: ModerationStep) -> Option<&StepStatus> {
        self.steps
            .iter()
            .find(|report| report.step == step)
            .map(|report| &report.status)
    }

    #[allow(dead_code)]
    pub fn succeeded(&self, step: ModerationStep) -> bool {
        self.status_of(step) == Some(&StepStatus::Succeeded)
    }

    pub fn failed_steps(&self) -> Vec<ModerationStep> {
        self.steps
            .iter()
            .filter(|report| matches!(report.status, StepStatus::Failed(_)))
            .map(|report| report.step)
            .collect()
    }
}

/// What `handle` did with a message.
#[derive(Debug, Clone)]
pub enum ModerationOutcome {
    /// No prohibited terms - nothing happened
    Clean,
    /// Author is a bot - nothing happened
    Exempt,
    /// At least one prohibited term matched
    Moderated(ModerationReport),
}

impl ModerationOutcome {
    pub fn report(&self) -> Option<&ModerationReport> {
        match self {
            ModerationOutcome::Moderated(report) => Some(report),
            _ => None,
        }
    }
}

/// Runtime configuration for the moderation pipeline.
///
/// Channel ids are required; `ModerationService::new` refuses to start
/// without them or without at least one prohibited term.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Where the public violation record goes
    pub public_channel_id: Option<u64>,
    /// Where kick/ban notices go
    pub admin_channel_id: Option<u64>,
    pub prohibited_terms: Vec<String>,
    /// Upper bound on any single platform call
    pub action_timeout_secs: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            public_channel_id: None,
            admin_channel_id: None,
            prohibited_terms: Vec::new(),
            action_timeout_secs: 10,
        }
    }
}
