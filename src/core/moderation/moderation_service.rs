// Moderation service - core business logic for prohibited-term enforcement.
//
// This service handles:
// - Detecting prohibited terms (via the violation matcher)
// - Counting violations per user (via the offender ledger port)
// - Escalating sanctions (via the sanction policy)
// - Driving the platform side effects (via the moderation actions port)
//
// Every side effect is best-effort: a failing step is logged and reported in
// the outcome, and the remaining steps still run. `handle` never fails.
//
// NO Discord dependencies here - just pure domain logic.

use super::moderation_models::{
    InboundMessage, MessageRef, ModerationConfig, ModerationEvent, ModerationOutcome,
    ModerationReport, ModerationStep, SanctionTier, StepReport, StepStatus,
};
use super::sanction_policy::{threshold_for, tier_for};
use super::violation_matcher::ViolationMatcher;
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Longest quote of the offending message we put in the public record.
const MAX_QUOTED_CHARS: usize = 1024;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Failure of a single platform call.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
}

// ============================================================================
// PORTS
// ============================================================================

/// Per-user violation counter.
///
/// The in-memory implementation lives for the process lifetime; the SQLite
/// one survives restarts. Callers can't tell the difference.
#[async_trait]
pub trait OffenderLedger: Send + Sync {
    /// Add one violation and return the new total, as a single atomic step.
    async fn increment(&self, user_id: u64) -> Result<u32, ModerationError>;

    /// Current total without changing it. 0 for users never seen.
    async fn current_count(&self, user_id: u64) -> Result<u32, ModerationError>;
}

#[async_trait]
impl<T: OffenderLedger + ?Sized> OffenderLedger for Box<T> {
    async fn increment(&self, user_id: u64) -> Result<u32, ModerationError> {
        (**self).increment(user_id).await
    }

    async fn current_count(&self, user_id: u64) -> Result<u32, ModerationError> {
        (**self).current_count(user_id).await
    }
}

/// Side effects the chat platform must provide.
#[async_trait]
pub trait ModerationActions: Send + Sync {
    async fn delete_message(&self, message: MessageRef) -> Result<(), ActionError>;

    /// Recipients may have DMs disabled; that is just another `Err`.
    async fn send_direct_message(&self, user_id: u64, content: &str) -> Result<(), ActionError>;

    async fn apply_timeout(&self, user_id: u64, duration: Duration) -> Result<(), ActionError>;

    async fn kick(&self, user_id: u64, reason: &str) -> Result<(), ActionError>;

    async fn ban(&self, user_id: u64, reason: &str) -> Result<(), ActionError>;

    async fn post_to_channel(&self, channel_id: u64, content: &str) -> Result<(), ActionError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Moderation orchestrator: matcher -> ledger -> policy -> side effects.
pub struct ModerationService<L: OffenderLedger> {
    matcher: ViolationMatcher,
    ledger: L,
    public_channel_id: u64,
    admin_channel_id: u64,
    action_timeout: Duration,
}

impl<L: OffenderLedger> ModerationService<L> {
    /// Build the service, refusing to start on incomplete configuration.
    pub fn new(config: ModerationConfig, ledger: L) -> Result<Self, ModerationError> {
        config.validate()?;

        let public_channel_id = config
            .public_channel_id
            .ok_or_else(|| ModerationError::Config("public channel is not set".to_string()))?;
        let admin_channel_id = config
            .admin_channel_id
            .ok_or_else(|| ModerationError::Config("admin channel is not set".to_string()))?;

        let matcher = ViolationMatcher::new(&config.prohibited_terms);
        if matcher.is_empty() {
            return Err(ModerationError::Config(
                "no usable prohibited terms configured".to_string(),
            ));
        }

        tracing::debug!(terms = ?matcher.terms().collect::<Vec<_>>(), "Prohibited terms loaded");
        tracing::info!(
            terms = matcher.len(),
            public_channel_id,
            admin_channel_id,
            "Moderation service ready"
        );

        Ok(Self {
            matcher,
            ledger,
            public_channel_id,
            admin_channel_id,
            action_timeout: Duration::from_secs(config.action_timeout_secs),
        })
    }

    /// Override the per-call platform timeout.
    #[cfg(test)]
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Current violation total for a user.
    #[allow(dead_code)]
    pub async fn violation_count(&self, user_id: u64) -> Result<u32, ModerationError> {
        self.ledger.current_count(user_id).await
    }

    /// Process one inbound message.
    ///
    /// Bot authors and clean messages produce no side effects at all. For a
    /// violation the steps run in order and each one is isolated: a failure
    /// is logged, recorded in the report, and the next step still runs.
    pub async fn handle<A>(&self, message: &InboundMessage, actions: &A) -> ModerationOutcome
    where
        A: ModerationActions + ?Sized,
    {
        if message.author_is_bot {
            return ModerationOutcome::Exempt;
        }

        let matched_terms = self.matcher.detect(&message.text);
        if matched_terms.is_empty() {
            return ModerationOutcome::Clean;
        }

        let user_id = message.author_id;
        tracing::info!(
            user_id,
            guild_id = ?message.guild_id,
            channel_id = message.channel_id,
            terms = ?matched_terms,
            "Prohibited terms detected"
        );

        let mut steps = Vec::with_capacity(6);

        // 1. Remove the offending message
        let status = self
            .run_step(
                user_id,
                ModerationStep::DeleteMessage,
                actions.delete_message(message.message_ref()),
            )
            .await;
        steps.push(StepReport {
            step: ModerationStep::DeleteMessage,
            status,
        });

        // 2. Warn the user privately
        let warning = warning_text(&matched_terms);
        let status = self
            .run_step(
                user_id,
                ModerationStep::WarnUser,
                actions.send_direct_message(user_id, &warning),
            )
            .await;
        steps.push(StepReport {
            step: ModerationStep::WarnUser,
            status,
        });

        // 3. Count the violation; counting does not depend on the warning landing
        let violation_count = match self.ledger.increment(user_id).await {
            Ok(count) => {
                tracing::info!(user_id, count, "Violation recorded");
                steps.push(StepReport {
                    step: ModerationStep::RecordViolation,
                    status: StepStatus::Succeeded,
                });
                Some(count)
            }
            Err(e) => {
                tracing::error!(
                    user_id,
                    step = %ModerationStep::RecordViolation,
                    error = %e,
                    "Failed to record violation"
                );
                steps.push(StepReport {
                    step: ModerationStep::RecordViolation,
                    status: StepStatus::Failed(e.to_string()),
                });
                None
            }
        };

        // 4. Escalate
        let sanction_tier = violation_count.map(tier_for).unwrap_or(SanctionTier::None);
        let status = if sanction_tier == SanctionTier::None {
            StepStatus::Skipped
        } else {
            tracing::info!(user_id, tier = %sanction_tier, "Applying sanction");
            self.run_step(
                user_id,
                ModerationStep::ApplySanction,
                apply_sanction(actions, user_id, sanction_tier),
            )
            .await
        };
        steps.push(StepReport {
            step: ModerationStep::ApplySanction,
            status,
        });

        let event = ModerationEvent {
            offending_user_id: user_id,
            matched_terms,
            original_text: message.text.clone(),
            sanction_tier,
            violation_count,
            timestamp: Utc::now(),
        };

        // 5. Public record, published whether or not the sanction worked
        let record = self.render_public_record(&event);
        let status = self
            .run_step(
                user_id,
                ModerationStep::PublishRecord,
                actions.post_to_channel(self.public_channel_id, &record),
            )
            .await;
        steps.push(StepReport {
            step: ModerationStep::PublishRecord,
            status,
        });

        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(target: "moderation::audit", record = %json, "Moderation event"),
            Err(e) => tracing::warn!(user_id, error = %e, "Failed to serialize moderation event"),
        }

        // 6. Admins hear about kicks and bans whether or not they worked
        let status = if sanction_tier.is_severe() {
            self.run_step(
                user_id,
                ModerationStep::NotifyAdmins,
                actions.post_to_channel(self.admin_channel_id, &admin_notice(user_id, sanction_tier)),
            )
            .await
        } else {
            StepStatus::Skipped
        };
        steps.push(StepReport {
            step: ModerationStep::NotifyAdmins,
            status,
        });

        ModerationOutcome::Moderated(ModerationReport { event, steps })
    }

    /// Await one platform call under the action timeout and log the result.
    async fn run_step<F>(&self, user_id: u64, step: ModerationStep, action: F) -> StepStatus
    where
        F: Future<Output = Result<(), ActionError>>,
    {
        let result = match tokio::time::timeout(self.action_timeout, action).await {
            Ok(result) => result,
            Err(_) => Err(ActionError::TimedOut(self.action_timeout)),
        };

        match result {
            Ok(()) => {
                tracing::debug!(user_id, step = %step, "Moderation step completed");
                StepStatus::Succeeded
            }
            Err(e) => {
                tracing::warn!(user_id, step = %step, error = %e, "Moderation step failed");
                StepStatus::Failed(e.to_string())
            }
        }
    }

    /// Plain-text public record with the matched terms in bold.
    ///
    /// The quoted text is the offender's, so any mention syntax in it is
    /// broken up before it reaches a channel.
    fn render_public_record(&self, event: &ModerationEvent) -> String {
        let quoted = truncate_chars(&event.original_text, MAX_QUOTED_CHARS);
        let highlighted =
            neutralize_mentions(&self.matcher.highlight(&quoted, &event.matched_terms));

        let sanction = match event.violation_count {
            Some(count) => format!("{} (violation #{})", event.sanction_tier, count),
            None => format!("{} (violation count unavailable)", event.sanction_tier),
        };

        format!(
            "🚨 **Rule Violation Detected**\n\
             **Offending User:** <@{user}> ({user})\n\
             **Original Message:** {highlighted}\n\
             **Detected Words:** {words}\n\
             **Sanction:** {sanction}",
            user = event.offending_user_id,
            highlighted = highlighted,
            words = event.matched_terms.join(", "),
            sanction = sanction,
        )
    }
}

async fn apply_sanction<A>(actions: &A, user_id: u64, tier: SanctionTier) -> Result<(), ActionError>
where
    A: ModerationActions + ?Sized,
{
    match tier {
        SanctionTier::None => Ok(()),
        SanctionTier::Kick => actions.kick(user_id, &sanction_reason(tier)).await,
        SanctionTier::Ban => actions.ban(user_id, &sanction_reason(tier)).await,
        timeout => match timeout.timeout_duration() {
            Some(duration) => actions.apply_timeout(user_id, duration).await,
            None => Ok(()),
        },
    }
}

fn warning_text(matched_terms: &[String]) -> String {
    format!(
        "⚠️ **Content Warning**\n\
         You used prohibited words: {}\n\
         Repeated violations will result in mutes/bans!",
        matched_terms.join(", ")
    )
}

fn sanction_reason(tier: SanctionTier) -> String {
    format!("Excessive warnings ({}+)", threshold_for(tier))
}

fn admin_notice(user_id: u64, tier: SanctionTier) -> String {
    let verb = if tier == SanctionTier::Ban {
        "Banned"
    } else {
        "Kicked"
    };
    format!("{} <@{}> for {}+ warnings", verb, user_id, threshold_for(tier))
}

/// Put a zero-width space after every `@` so `@everyone`, `@here`, `<@id>`
/// and `<@&role>` render as text instead of pinging.
fn neutralize_mentions(text: &str) -> String {
    text.replace('@', "@\u{200B}")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
