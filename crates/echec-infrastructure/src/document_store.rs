//! In-memory document store.
//!
//! Holds the `conversations`, `users` and `games` collections and can be
//! loaded from or saved to a JSON export:
//!
//! ```json
//! {
//!   "conversations": [{ "id": "c1", "participants": ["U", "A"] }],
//!   "users": { "A": { "username": "ann", "avatar": "/a.png" } },
//!   "games": [{ "name": "Chess" }]
//! }
//! ```

use async_trait::async_trait;
use echec_core::EchecError;
use echec_core::conversation::{ConversationRecord, ConversationRepository};
use echec_core::error::Result;
use echec_core::profile::{GameCatalogRepository, ProfileRepository, UserDocument};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A document of the `games` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEntry {
    pub name: String,
}

/// On-disk shape of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreExport {
    pub conversations: Vec<ConversationRecord>,
    /// User documents keyed by identifier; the identifier is not repeated
    /// inside the document.
    pub users: BTreeMap<String, Map<String, Value>>,
    pub games: Vec<GameEntry>,
}

#[derive(Debug, Default)]
struct Collections {
    conversations: Vec<ConversationRecord>,
    users: HashMap<String, UserDocument>,
    games: Vec<GameEntry>,
}

/// Document store kept entirely in memory.
///
/// Conversations keep their insertion order, which is the order queries
/// return them in.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from an export, assigning ids to conversations that
    /// have none.
    pub fn from_export(export: StoreExport) -> Self {
        let conversations = export
            .conversations
            .into_iter()
            .map(with_assigned_id)
            .collect();
        let users = export
            .users
            .into_iter()
            .map(|(id, fields)| (id.clone(), UserDocument { id, fields }))
            .collect();

        Self {
            collections: RwLock::new(Collections {
                conversations,
                users,
                games: export.games,
            }),
        }
    }

    /// Reads a JSON export from `path`.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let export: StoreExport = serde_json::from_str(&content)?;
        tracing::debug!(
            "[InMemoryDocumentStore] Loaded {} conversations, {} users, {} games from {}",
            export.conversations.len(),
            export.users.len(),
            export.games.len(),
            path.display()
        );
        Ok(Self::from_export(export))
    }

    /// Writes the current contents to `path` as a JSON export.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let export = self.export().await;
        let content = serde_json::to_string_pretty(&export)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        tracing::debug!("[InMemoryDocumentStore] Saved to {}", path.display());
        Ok(())
    }

    pub async fn export(&self) -> StoreExport {
        let collections = self.collections.read().await;
        StoreExport {
            conversations: collections.conversations.clone(),
            users: collections
                .users
                .values()
                .map(|doc| (doc.id.clone(), doc.fields.clone()))
                .collect(),
            games: collections.games.clone(),
        }
    }

    /// Appends a conversation and returns its id.
    pub async fn insert_conversation(&self, record: ConversationRecord) -> String {
        let record = with_assigned_id(record);
        let id = record.id.clone();
        self.collections.write().await.conversations.push(record);
        id
    }

    /// Inserts or replaces a user document.
    pub async fn upsert_user(&self, document: UserDocument) {
        self.collections
            .write()
            .await
            .users
            .insert(document.id.clone(), document);
    }

    pub async fn add_game(&self, name: impl Into<String>) {
        self.collections
            .write()
            .await
            .games
            .push(GameEntry { name: name.into() });
    }
}

fn with_assigned_id(mut record: ConversationRecord) -> ConversationRecord {
    if record.id.is_empty() {
        record.id = Uuid::new_v4().to_string();
    }
    record
}

#[async_trait]
impl ConversationRepository for InMemoryDocumentStore {
    async fn find_by_participant(&self, user_id: &str) -> Result<Vec<ConversationRecord>> {
        let collections = self.collections.read().await;
        Ok(collections
            .conversations
            .iter()
            .filter(|record| record.participants.iter().any(|p| p == user_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryDocumentStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserDocument>> {
        Ok(self.collections.read().await.users.get(user_id).cloned())
    }

    async fn update_field(&self, user_id: &str, field: &str, value: Value) -> Result<()> {
        if field.is_empty() || field == "id" {
            return Err(EchecError::validation(format!(
                "'{}' is not a writable field",
                field
            )));
        }
        let mut collections = self.collections.write().await;
        let document = collections
            .users
            .get_mut(user_id)
            .ok_or_else(|| EchecError::not_found("UserDocument", user_id))?;
        document.fields.insert(field.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl GameCatalogRepository for InMemoryDocumentStore {
    async fn list_names(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        Ok(collections.games.iter().map(|g| g.name.clone()).collect())
    }
}
