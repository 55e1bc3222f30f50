// Loading and validating the moderation configuration.
//
// Sources, later ones win:
// 1. a JSON file (`MODERATION_CONFIG_FILE`, or `configuration.json` when present)
// 2. environment variables
//
// File shape:
// { "services": { "hall_of_shame": { "channel": 1, "admin_channel": 2, "bad_words": ["..."] } } }

use super::moderation_models::ModerationConfig;
use super::moderation_service::ModerationError;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE_VAR: &str = "MODERATION_CONFIG_FILE";
pub const PUBLIC_CHANNEL_VAR: &str = "MODERATION_PUBLIC_CHANNEL_ID";
pub const ADMIN_CHANNEL_VAR: &str = "MODERATION_ADMIN_CHANNEL_ID";
pub const TERMS_VAR: &str = "MODERATION_PROHIBITED_TERMS";
pub const ACTION_TIMEOUT_VAR: &str = "MODERATION_ACTION_TIMEOUT_SECS";

const DEFAULT_CONFIG_FILE: &str = "configuration.json";

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    services: ServicesSection,
}

#[derive(Debug, Default, Deserialize)]
struct ServicesSection {
    #[serde(default)]
    hall_of_shame: HallOfShameSection,
}

#[derive(Debug, Default, Deserialize)]
struct HallOfShameSection {
    channel: Option<u64>,
    admin_channel: Option<u64>,
    #[serde(default)]
    bad_words: Vec<String>,
    action_timeout_secs: Option<u64>,
}

impl ModerationConfig {
    /// Load from the process environment (after `dotenv`) and the optional JSON file.
    pub fn from_env() -> Result<Self, ModerationError> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with the variable lookup injected.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ModerationError> {
        let base = match lookup(CONFIG_FILE_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        let config = base.with_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ModerationError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ModerationError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModerationError> {
        let file: ConfigFile = serde_json::from_str(raw)
            .map_err(|e| ModerationError::Config(format!("invalid configuration JSON: {}", e)))?;
        let section = file.services.hall_of_shame;

        let defaults = Self::default();
        Ok(Self {
            public_channel_id: section.channel,
            admin_channel_id: section.admin_channel,
            prohibited_terms: section.bad_words,
            action_timeout_secs: section
                .action_timeout_secs
                .unwrap_or(defaults.action_timeout_secs),
        })
    }

    /// Apply environment overrides on top of whatever was loaded so far.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ModerationError> {
        if let Some(raw) = lookup(PUBLIC_CHANNEL_VAR) {
            self.public_channel_id = Some(parse_number(PUBLIC_CHANNEL_VAR, &raw)?);
        }
        if let Some(raw) = lookup(ADMIN_CHANNEL_VAR) {
            self.admin_channel_id = Some(parse_number(ADMIN_CHANNEL_VAR, &raw)?);
        }
        if let Some(raw) = lookup(TERMS_VAR) {
            self.prohibited_terms = raw
                .split(',')
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(raw) = lookup(ACTION_TIMEOUT_VAR) {
            self.action_timeout_secs = parse_number(ACTION_TIMEOUT_VAR, &raw)?;
        }
        Ok(self)
    }

    /// Everything the pipeline needs must be present before it starts.
    pub fn validate(&self) -> Result<(), ModerationError> {
        match self.public_channel_id {
            None | Some(0) => {
                return Err(ModerationError::Config(format!(
                    "public moderation channel not configured (set {})",
                    PUBLIC_CHANNEL_VAR
                )))
            }
            Some(_) => {}
        }
        match self.admin_channel_id {
            None | Some(0) => {
                return Err(ModerationError::Config(format!(
                    "admin channel not configured (set {})",
                    ADMIN_CHANNEL_VAR
                )))
            }
            Some(_) => {}
        }
        if self.prohibited_terms.iter().all(|term| term.trim().is_empty()) {
            return Err(ModerationError::Config(format!(
                "prohibited term list is empty (set {})",
                TERMS_VAR
            )));
        }
        if self.action_timeout_secs == 0 {
            return Err(ModerationError::Config(
                "action timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number(var: &str, raw: &str) -> Result<u64, ModerationError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ModerationError::Config(format!("{} must be a number: {}", var, e)))
}
