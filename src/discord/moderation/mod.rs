// Discord side of moderation.
// - `actions.rs`: serenity implementation of the ModerationActions port
// - `message_handler.rs`: turns a serenity message into a core InboundMessage

pub mod actions;
pub mod message_handler;

pub use actions::DiscordModerationActions;
pub use message_handler::handle_message_for_moderation;
