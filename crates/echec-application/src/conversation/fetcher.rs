//! Conversation list construction.
//!
//! Turns the raw conversation documents of a user into one summary per
//! counterpart.

use echec_core::EchecError;
use echec_core::conversation::{ConversationRecord, ConversationRepository, ConversationSummary};
use echec_core::error::Result;
use std::collections::HashSet;
use std::sync::Arc;

/// Output of one fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// One summary per counterpart, in store order of first appearance
    pub summaries: Vec<ConversationSummary>,
    /// Distinct counterpart identifiers, same order as `summaries`
    pub counterpart_ids: Vec<String>,
    /// Records that could not be resolved against the user
    pub skipped: Vec<EchecError>,
}

/// Builds the deduplicated summary list for `user_id`.
///
/// Records are visited in the given order. The first record naming a
/// counterpart wins; later records with the same counterpart are dropped.
/// Malformed records are skipped and reported, never fatal.
pub fn summarize(user_id: &str, records: Vec<ConversationRecord>) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();

    for record in &records {
        let summary = match ConversationSummary::from_record(record, user_id) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("[ConversationFetcher] Skipping record: {}", e);
                outcome.skipped.push(e);
                continue;
            }
        };

        if !seen.insert(summary.other_participant_id.clone()) {
            tracing::trace!(
                "[ConversationFetcher] '{}' duplicates counterpart '{}'",
                summary.conversation_id,
                summary.other_participant_id
            );
            continue;
        }

        outcome
            .counterpart_ids
            .push(summary.other_participant_id.clone());
        outcome.summaries.push(summary);
    }

    outcome
}

/// Runs the conversation query for a user and summarizes the result.
pub struct ConversationFetcher {
    repository: Arc<dyn ConversationRepository>,
}

impl ConversationFetcher {
    /// Creates a fetcher over the given conversation store.
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    /// Fetches and summarizes every conversation `user_id` takes part in.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the query is rejected, and a
    /// validation error for an empty identifier.
    pub async fn fetch(&self, user_id: &str) -> Result<FetchOutcome> {
        if user_id.is_empty() {
            return Err(EchecError::validation("user identifier must not be empty"));
        }

        let records = self.repository.find_by_participant(user_id).await?;
        let total = records.len();
        let outcome = summarize(user_id, records);

        tracing::debug!(
            "[ConversationFetcher] user={} records={} summaries={} skipped={}",
            user_id,
            total,
            outcome.summaries.len(),
            outcome.skipped.len()
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockConversationRepository {
        records: Mutex<Vec<ConversationRecord>>,
        reject: bool,
    }

    impl MockConversationRepository {
        fn new(records: Vec<ConversationRecord>) -> Self {
            Self {
                records: Mutex::new(records),
                reject: false,
            }
        }
    }

    #[async_trait]
    impl ConversationRepository for MockConversationRepository {
        async fn find_by_participant(&self, user_id: &str) -> Result<Vec<ConversationRecord>> {
            if self.reject {
                return Err(EchecError::data_access("permission denied"));
            }
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .filter(|r| r.participants.iter().any(|p| p == user_id))
                .cloned()
                .collect())
        }
    }

    fn ids(outcome: &FetchOutcome) -> Vec<(&str, &str)> {
        outcome
            .summaries
            .iter()
            .map(|s| (s.conversation_id.as_str(), s.other_participant_id.as_str()))
            .collect()
    }

    #[test]
    fn test_duplicate_counterpart_keeps_first_record() {
        let outcome = summarize(
            "U",
            vec![
                ConversationRecord::new("c1", ["U", "A"]),
                ConversationRecord::new("c2", ["U", "B"]),
                ConversationRecord::new("c3", ["U", "A"]),
            ],
        );

        assert_eq!(ids(&outcome), vec![("c1", "A"), ("c2", "B")]);
        assert_eq!(outcome.counterpart_ids, vec!["A", "B"]);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_store_order_breaks_ties_not_payload() {
        let outcome = summarize(
            "U",
            vec![
                ConversationRecord::new("old", ["A", "U"]).with_field("updatedAt", json!(1)),
                ConversationRecord::new("new", ["U", "A"]).with_field("updatedAt", json!(99)),
            ],
        );

        assert_eq!(ids(&outcome), vec![("old", "A")]);
        assert_eq!(outcome.summaries[0].fields.get("updatedAt"), Some(&json!(1)));
    }

    #[test]
    fn test_malformed_records_are_skipped_not_fatal() {
        let outcome = summarize(
            "U",
            vec![
                ConversationRecord::new("self", ["U", "U"]),
                ConversationRecord::new("c1", ["U", "A"]),
                ConversationRecord::new("foreign", ["X", "Y"]),
                ConversationRecord::new("c2", ["B", "U"]),
            ],
        );

        assert_eq!(ids(&outcome), vec![("c1", "A"), ("c2", "B")]);
        assert_eq!(outcome.skipped.len(), 2);
        assert!(outcome.skipped.iter().all(EchecError::is_malformed));
    }

    #[test]
    fn test_every_valid_counterpart_is_represented() {
        let records: Vec<ConversationRecord> = ["A", "B", "A", "C", "B", "D"]
            .iter()
            .enumerate()
            .map(|(i, other)| ConversationRecord::new(format!("c{}", i), ["U", *other]))
            .collect();

        let outcome = summarize("U", records.clone());

        for record in &records {
            let other = record.other_participant("U").unwrap();
            assert!(outcome.counterpart_ids.iter().any(|id| id == other));
        }
        assert_eq!(outcome.summaries.len(), outcome.counterpart_ids.len());
        assert_eq!(outcome.counterpart_ids, vec!["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_fetch_queries_store_for_user() {
        let repo = Arc::new(MockConversationRepository::new(vec![
            ConversationRecord::new("c1", ["U", "A"]),
            ConversationRecord::new("c9", ["V", "A"]),
        ]));
        let fetcher = ConversationFetcher::new(repo);

        let outcome = fetcher.fetch("U").await.unwrap();
        assert_eq!(ids(&outcome), vec![("c1", "A")]);
    }

    #[tokio::test]
    async fn test_fetch_propagates_store_rejection() {
        let repo = Arc::new(MockConversationRepository {
            records: Mutex::new(Vec::new()),
            reject: true,
        });
        let fetcher = ConversationFetcher::new(repo);

        let err = fetcher.fetch("U").await.unwrap_err();
        assert!(err.is_data_access());
    }

    #[tokio::test]
    async fn test_fetch_requires_identity() {
        let fetcher = ConversationFetcher::new(Arc::new(MockConversationRepository::new(vec![])));
        assert!(fetcher.fetch("").await.unwrap_err().is_validation());
    }
}
