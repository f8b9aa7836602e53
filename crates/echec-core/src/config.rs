//! Configuration model.
//!
//! Every key is optional; a missing file or section yields the defaults
//! below.

use serde::{Deserialize, Serialize};

/// Placeholder image shown for participants without an avatar.
pub const DEFAULT_AVATAR: &str = "/image.png";

/// Label shown when a participant has neither a username nor a first name.
pub const DEFAULT_FALLBACK_LABEL: &str = "User";

/// Upper bound on games a player can pin to their profile.
pub const DEFAULT_MAX_SELECTED_GAMES: usize = 4;

/// What happens to the participant lookup when the user signs out.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupRetention {
    /// Drop every resolved profile on sign-out and when a different user
    /// signs in.
    #[default]
    ClearOnSignOut,
    /// Keep resolved profiles for the lifetime of the process.
    Retain,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConversationSettings {
    pub default_avatar: String,
    pub fallback_label: String,
    pub lookup_retention: LookupRetention,
    /// Capacity of the broadcast channel carrying session events.
    pub event_capacity: usize,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            default_avatar: DEFAULT_AVATAR.to_string(),
            fallback_label: DEFAULT_FALLBACK_LABEL.to_string(),
            lookup_retention: LookupRetention::default(),
            event_capacity: 64,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileSettings {
    pub max_selected_games: usize,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            max_selected_games: DEFAULT_MAX_SELECTED_GAMES,
        }
    }
}

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RootConfig {
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
    pub conversations: ConversationSettings,
    pub profile: ProfileSettings,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            conversations: ConversationSettings::default(),
            profile: ProfileSettings::default(),
        }
    }
}

impl RootConfig {
    /// Parses a TOML document, filling absent keys with defaults.
    pub fn from_toml_str(content: &str) -> crate::error::Result<Self> {
        let config: RootConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the application cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.conversations.event_capacity == 0 {
            return Err(crate::error::EchecError::config(
                "conversations.event_capacity must be greater than zero",
            ));
        }
        if self.conversations.fallback_label.trim().is_empty() {
            return Err(crate::error::EchecError::config(
                "conversations.fallback_label must not be empty",
            ));
        }
        Ok(())
    }
}
