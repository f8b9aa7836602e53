use anyhow::{Context, Result, bail};
use echec_application::{ProfileService, ToggleOutcome};
use echec_core::config::RootConfig;
use echec_core::profile::ProfileField;
use echec_infrastructure::InMemoryDocumentStore;
use std::path::Path;
use std::sync::Arc;

async fn open(config: &RootConfig, store_path: &Path) -> Result<(Arc<InMemoryDocumentStore>, ProfileService)> {
    let store = Arc::new(
        InMemoryDocumentStore::load(store_path)
            .await
            .with_context(|| format!("Failed to load store {}", store_path.display()))?,
    );
    let service = ProfileService::new(store.clone(), store.clone(), config.profile.clone());
    Ok((store, service))
}

pub async fn show(config: &RootConfig, store_path: &Path, user: &str, json: bool) -> Result<()> {
    let (_, service) = open(config, store_path).await?;
    let Some(profile) = service.load(user).await? else {
        bail!("No profile for '{}'", user);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("Profil de {}", profile.username.as_deref().unwrap_or(user));
    for field in ProfileField::ALL {
        println!("{:<18} {}", field.label(), profile.field(field).unwrap_or("-"));
    }
    println!("{:<18} {}", "Jeux", profile.games.join(", "));
    Ok(())
}

pub async fn set(
    config: &RootConfig,
    store_path: &Path,
    user: &str,
    field: &str,
    value: &str,
) -> Result<()> {
    let field: ProfileField = field.parse()?;
    let (store, service) = open(config, store_path).await?;
    service.update_field(user, field, value).await?;
    store.save(store_path).await?;
    println!("{} = {}", field.label(), value);
    Ok(())
}

pub async fn games(config: &RootConfig, store_path: &Path, user: &str, toggle: &[String]) -> Result<()> {
    let (store, service) = open(config, store_path).await?;
    let Some(profile) = service.load(user).await? else {
        bail!("No profile for '{}'", user);
    };

    let catalog = service.list_games().await?;
    let mut selection = service.selection_for(&profile);
    for game in toggle {
        if !catalog.contains(game) {
            bail!("'{}' is not in the game catalog", game);
        }
        if selection.toggle(game) == ToggleOutcome::LimitReached {
            tracing::warn!(
                "Selection is full ({} games), '{}' not added",
                selection.max(),
                game
            );
        }
    }

    if !toggle.is_empty() {
        service.save_games(user, &selection).await?;
        store.save(store_path).await?;
    }

    println!("Sélectionnez jusqu'à {} jeux :", selection.max());
    for game in &catalog {
        let mark = if selection.contains(game) { "x" } else { " " };
        println!("[{}] {}", mark, game);
    }
    Ok(())
}
