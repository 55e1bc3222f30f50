// This is the entry point of the moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (storage)
// - `discord/` = Discord-specific adapters (actions, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Route message events into the moderation pipeline

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::moderation::{ModerationConfig, ModerationService, OffenderLedger};
use crate::discord::moderation::handle_message_for_moderation;
use crate::discord::{Data, Error};
use crate::infra::moderation::{InMemoryOffenderLedger, SqliteOffenderLedger};
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            // Bot authors (including us) are exempted inside the moderation core
            handle_message_for_moderation(ctx, new_message, data.moderation.as_ref()).await;
        }
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(bot = %data_about_bot.user.name, "Connected to Discord");
        }
        _ => {}
    }

    Ok(())
}

/// Pick the ledger backend. Counts only survive restarts with SQLite.
async fn build_ledger() -> anyhow::Result<Box<dyn OffenderLedger>> {
    match std::env::var("MODERATION_LEDGER_DB") {
        Ok(path) if !path.trim().is_empty() => {
            let ledger = SqliteOffenderLedger::new(path.trim())
                .await
                .with_context(|| format!("Failed to open offender ledger at {}", path))?;
            tracing::info!(path = %path, "Using SQLite offender ledger");
            Ok(Box::new(ledger))
        }
        _ => {
            tracing::warn!(
                "MODERATION_LEDGER_DB not set; violation counts are kept in memory and lost on restart"
            );
            Ok(Box::new(InMemoryOffenderLedger::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").context(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    )?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.
    // Incomplete moderation config stops us here rather than per message.

    let config = ModerationConfig::from_env().context("Invalid moderation configuration")?;
    let ledger = build_ledger().await?;
    let moderation =
        ModerationService::new(config, ledger).context("Failed to start moderation service")?;

    let data = Data {
        moderation: Arc::new(moderation),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|_ctx, _ready, _framework| {
            Box::pin(async move {
                tracing::info!("Moderation bot is ready");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
