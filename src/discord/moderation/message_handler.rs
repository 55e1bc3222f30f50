// Discord-specific moderation entry point - translates a serenity message
// into the core's InboundMessage and reports what the pipeline did.

use super::actions::DiscordModerationActions;
use crate::core::moderation::{InboundMessage, ModerationService, OffenderLedger};
use poise::serenity_prelude as serenity;

/// Strip a serenity message down to what the moderation core needs.
pub fn to_inbound(msg: &serenity::Message) -> InboundMessage {
    InboundMessage {
        guild_id: msg.guild_id.map(|id| id.get()),
        channel_id: msg.channel_id.get(),
        message_id: msg.id.get(),
        author_id: msg.author.id.get(),
        author_is_bot: msg.author.bot,
        text: msg.content.clone(),
    }
}

/// Run a message through the moderation pipeline.
///
/// Returns `true` if the message contained prohibited terms and was handled.
/// Never fails: every error inside the pipeline is logged and absorbed there.
pub async fn handle_message_for_moderation<L: OffenderLedger>(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    moderation: &ModerationService<L>,
) -> bool {
    // Timeouts, kicks and bans only exist inside a guild
    let guild_id = match msg.guild_id {
        Some(id) => id,
        None => return false,
    };

    let actions = DiscordModerationActions::new(ctx.http.clone(), guild_id);
    let outcome = moderation.handle(&to_inbound(msg), &actions).await;

    let Some(report) = outcome.report() else {
        return false;
    };

    let failed = report.failed_steps();
    if failed.is_empty() {
        tracing::info!(
            user_id = report.event.offending_user_id,
            guild_id = guild_id.get(),
            tier = %report.event.sanction_tier,
            "Violation handled"
        );
    } else {
        tracing::warn!(
            user_id = report.event.offending_user_id,
            guild_id = guild_id.get(),
            tier = %report.event.sanction_tier,
            failed_steps = ?failed,
            "Violation handled with failures; manual follow-up may be needed"
        );
    }
    true
}
