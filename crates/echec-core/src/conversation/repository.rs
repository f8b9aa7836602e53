//! Conversation repository trait.
//!
//! Defines the query the conversation list is built from.

use async_trait::async_trait;

use super::model::ConversationRecord;
use crate::error::Result;

/// Read access to the conversation collection of the document store.
///
/// Implementations decide how the predicate is executed (remote query,
/// in-memory scan); callers only rely on the returned order being stable for
/// a given store state, because deduplication keeps the first record seen.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Returns every conversation whose participant set contains `user_id`,
    /// in store order.
    ///
    /// # Returns
    ///
    /// - `Ok(records)`: possibly empty
    /// - `Err(EchecError::DataAccess)`: the store rejected the query
    async fn find_by_participant(&self, user_id: &str) -> Result<Vec<ConversationRecord>>;
}
