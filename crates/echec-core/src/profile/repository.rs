//! Profile and game catalog repository traits.

use async_trait::async_trait;
use serde_json::Value;

use super::model::UserDocument;
use crate::error::Result;

/// Point access to the user collection of the document store.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds a user document by identifier.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(document))`: document exists
    /// - `Ok(None)`: no document for this identifier
    /// - `Err(_)`: the store rejected the lookup
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserDocument>>;

    /// Overwrites a single top-level field of an existing document.
    ///
    /// Fails with `EchecError::NotFound` when the document does not exist.
    async fn update_field(&self, user_id: &str, field: &str, value: Value) -> Result<()>;
}

/// Read access to the catalog of games players can pin to their profile.
#[async_trait]
pub trait GameCatalogRepository: Send + Sync {
    /// Names of all catalog entries, in store order.
    async fn list_names(&self) -> Result<Vec<String>>;
}
