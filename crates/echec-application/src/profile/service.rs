//! Profile page use cases.

use echec_core::EchecError;
use echec_core::config::ProfileSettings;
use echec_core::error::Result;
use echec_core::profile::{GameCatalogRepository, ProfileField, ProfileRepository, UserProfile};
use serde_json::Value;
use std::sync::Arc;

use super::selection::GameSelection;

/// Reads and edits the signed-in user's own profile.
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    catalog: Arc<dyn GameCatalogRepository>,
    settings: ProfileSettings,
}

impl ProfileService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        catalog: Arc<dyn GameCatalogRepository>,
        settings: ProfileSettings,
    ) -> Self {
        Self {
            profiles,
            catalog,
            settings,
        }
    }

    /// Loads the profile of `user_id`.
    ///
    /// Returns `Ok(None)` when the user has no document.
    pub async fn load(&self, user_id: &str) -> Result<Option<UserProfile>> {
        require_identity(user_id)?;
        let document = self.profiles.find_by_id(user_id).await?;
        if document.is_none() {
            tracing::debug!("[ProfileService] No profile document for {}", user_id);
        }
        Ok(document.as_ref().map(UserProfile::from_document))
    }

    /// Overwrites one editable field of the user's document.
    pub async fn update_field(&self, user_id: &str, field: ProfileField, value: &str) -> Result<()> {
        require_identity(user_id)?;
        self.profiles
            .update_field(user_id, field.document_key(), Value::String(value.to_string()))
            .await?;
        tracing::info!(
            "[ProfileService] Updated {} of {}",
            field.document_key(),
            user_id
        );
        Ok(())
    }

    /// Names of every game in the catalog.
    pub async fn list_games(&self) -> Result<Vec<String>> {
        self.catalog.list_names().await
    }

    /// Editable selection seeded with the games already on the profile.
    pub fn selection_for(&self, profile: &UserProfile) -> GameSelection {
        GameSelection::from_games(profile.games.iter().cloned(), self.settings.max_selected_games)
    }

    /// Persists the selection as the `games` field of the user's document.
    ///
    /// # Errors
    ///
    /// `Validation` if the selection holds more games than allowed.
    pub async fn save_games(&self, user_id: &str, selection: &GameSelection) -> Result<()> {
        require_identity(user_id)?;
        if selection.len() > self.settings.max_selected_games {
            return Err(EchecError::validation(format!(
                "at most {} games can be selected, got {}",
                self.settings.max_selected_games,
                selection.len()
            )));
        }

        let games = selection
            .games()
            .iter()
            .cloned()
            .map(Value::String)
            .collect();
        self.profiles
            .update_field(user_id, "games", Value::Array(games))
            .await?;
        tracing::info!(
            "[ProfileService] Saved {} games for {}",
            selection.len(),
            user_id
        );
        Ok(())
    }
}

fn require_identity(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(EchecError::validation("user identifier must not be empty"));
    }
    Ok(())
}
