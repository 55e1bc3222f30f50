// Serenity implementation of ModerationActions.
//
// Each method is a thin translation of a core request into one Discord API
// call. Errors are converted to `ActionError` and handed back; deciding what
// to do about them is the core's job.

use crate::core::moderation::{ActionError, MessageRef, ModerationActions};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

/// Discord's hard limit on message content length.
const MAX_MESSAGE_CHARS: usize = 2000;

/// Moderation actions scoped to the guild a message came from.
pub struct DiscordModerationActions {
    http: Arc<serenity::Http>,
    guild_id: serenity::GuildId,
}

impl DiscordModerationActions {
    pub fn new(http: Arc<serenity::Http>, guild_id: serenity::GuildId) -> Self {
        Self { http, guild_id }
    }
}

fn platform(e: serenity::Error) -> ActionError {
    ActionError::Platform(e.to_string())
}

#[async_trait]
impl ModerationActions for DiscordModerationActions {
    async fn delete_message(&self, message: MessageRef) -> Result<(), ActionError> {
        serenity::ChannelId::new(message.channel_id)
            .delete_message(&self.http, serenity::MessageId::new(message.message_id))
            .await
            .map_err(platform)
    }

    async fn send_direct_message(&self, user_id: u64, content: &str) -> Result<(), ActionError> {
        // Fails with 403 when the user has DMs from server members turned off
        serenity::UserId::new(user_id)
            .direct_message(&self.http, serenity::CreateMessage::new().content(content))
            .await
            .map(|_| ())
            .map_err(platform)
    }

    async fn apply_timeout(&self, user_id: u64, duration: Duration) -> Result<(), ActionError> {
        let timeout_until = serenity::Timestamp::from_unix_timestamp(
            chrono::Utc::now().timestamp() + duration.as_secs() as i64,
        )
        .map_err(|e| ActionError::Platform(format!("invalid timeout timestamp: {}", e)))?;

        self.guild_id
            .edit_member(
                &self.http,
                serenity::UserId::new(user_id),
                serenity::EditMember::new().disable_communication_until_datetime(timeout_until),
            )
            .await
            .map(|_| ())
            .map_err(platform)
    }

    async fn kick(&self, user_id: u64, reason: &str) -> Result<(), ActionError> {
        self.guild_id
            .kick_with_reason(&self.http, serenity::UserId::new(user_id), reason)
            .await
            .map_err(platform)
    }

    async fn ban(&self, user_id: u64, reason: &str) -> Result<(), ActionError> {
        // Keep the user's message history; moderators may still need it
        self.guild_id
            .ban_with_reason(&self.http, serenity::UserId::new(user_id), 0, reason)
            .await
            .map_err(platform)
    }

    async fn post_to_channel(&self, channel_id: u64, content: &str) -> Result<(), ActionError> {
        let channel = serenity::ChannelId::new(channel_id);
        for chunk in split_message(content, MAX_MESSAGE_CHARS) {
            // Records quote user text and mention the offender; none of it should ping
            channel
                .send_message(
                    &self.http,
                    serenity::CreateMessage::new()
                        .content(chunk)
                        .allowed_mentions(serenity::CreateAllowedMentions::new()),
                )
                .await
                .map_err(platform)?;
        }
        Ok(())
    }
}

/// Split `content` into messages of at most `max` chars.
///
/// Breaks go between lines first, then between words, so mentions and
/// `**bold**` spans stay whole. Only a single word longer than `max` is cut.
fn split_message(content: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in content.split('\n') {
        for piece in split_line(line, max) {
            let piece_len = piece.chars().count();
            if !current.is_empty() && current_len + 1 + piece_len > max {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_line(line: &str, max: usize) -> Vec<String> {
    if line.chars().count() <= max {
        return vec![line.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split(' ') {
        let word_len = word.chars().count();
        if word_len > max {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(chars.chunks(max).map(|part| part.iter().collect::<String>()));
            continue;
        }
        if !current.is_empty() && current_len + 1 + word_len > max {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
