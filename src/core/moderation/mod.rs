// Core moderation module - prohibited-term detection and escalating sanctions.
// Models, pure matching and policy logic, and the service with its ports.

pub mod moderation_config;
pub mod moderation_models;
pub mod moderation_service;
pub mod sanction_policy;
pub mod violation_matcher;

pub use moderation_models::*;
pub use moderation_service::*;
