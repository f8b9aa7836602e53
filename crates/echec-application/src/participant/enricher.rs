//! Participant enrichment.
//!
//! Resolves conversation counterparts to display profiles with one store
//! lookup per identifier that is neither cached nor already being fetched.

use echec_core::EchecError;
use echec_core::participant::ParticipantProfile;
use echec_core::profile::{ProfileRepository, UserDocument};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::lookup::{LookupGeneration, LookupPass, MergeOutcome, ParticipantLookup, Reservation};

/// Counters for one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Identifiers handed to the pass
    pub requested: usize,
    /// Store lookups issued
    pub fetched: usize,
    /// Profiles written to the lookup
    pub merged: usize,
    /// Lookups that found no document
    pub missing: usize,
    /// Lookups rejected by the store
    pub failed: usize,
    pub skipped_cached: usize,
    pub skipped_in_flight: usize,
    /// Completions dropped because the identity changed
    pub discarded_stale: usize,
    pub cancelled: usize,
}

enum LookupResult {
    Found(UserDocument),
    Missing,
    Failed(EchecError),
    Cancelled,
}

/// Resolves participant identifiers into [`ParticipantProfile`]s.
pub struct ParticipantEnricher {
    repository: Arc<dyn ProfileRepository>,
    default_avatar: String,
}

impl ParticipantEnricher {
    /// Creates an enricher that reads user documents from `repository` and
    /// substitutes `default_avatar` for documents without one.
    pub fn new(repository: Arc<dyn ProfileRepository>, default_avatar: impl Into<String>) -> Self {
        Self {
            repository,
            default_avatar: default_avatar.into(),
        }
    }

    /// Fetches every identifier in `ids` that the lookup does not already
    /// hold and merges the results as they complete.
    ///
    /// Each identifier is checked against the lookup when its fetch is
    /// scheduled. Fetches run concurrently and may complete in any order;
    /// `on_merge` is called after every profile written, so the caller can
    /// signal partial progress. Missing documents and store failures leave
    /// the identifier absent. Once `cancel` fires, outstanding fetches are
    /// abandoned and their reservations released. If the returned future is
    /// dropped instead, its reservations become reclaimable by the next pass.
    pub async fn enrich<F>(
        &self,
        ids: &[String],
        lookup: &ParticipantLookup,
        generation: LookupGeneration,
        cancel: &CancellationToken,
        mut on_merge: F,
    ) -> EnrichmentReport
    where
        F: FnMut(&str),
    {
        let mut report = EnrichmentReport {
            requested: ids.len(),
            ..Default::default()
        };
        let pass = LookupPass::new();
        let mut tasks = JoinSet::new();
        let mut outstanding: HashSet<String> = HashSet::new();

        for id in ids {
            match lookup.reserve(&pass, generation, id).await {
                Reservation::Acquired => {}
                Reservation::Cached => {
                    report.skipped_cached += 1;
                    continue;
                }
                Reservation::InFlight => {
                    report.skipped_in_flight += 1;
                    continue;
                }
                Reservation::Stale => {
                    tracing::debug!(
                        "[ParticipantEnricher] Generation {} is stale, not scheduling '{}'",
                        generation.value(),
                        id
                    );
                    report.discarded_stale += 1;
                    continue;
                }
            }

            report.fetched += 1;
            outstanding.insert(id.clone());

            let repository = self.repository.clone();
            let cancel = cancel.clone();
            let id = id.clone();
            tasks.spawn(async move {
                let result = tokio::select! {
                    _ = cancel.cancelled() => LookupResult::Cancelled,
                    found = repository.find_by_id(&id) => match found {
                        Ok(Some(document)) => LookupResult::Found(document),
                        Ok(None) => LookupResult::Missing,
                        Err(e) => LookupResult::Failed(e),
                    },
                };
                (id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (id, result) = match joined {
                Ok(completed) => completed,
                Err(e) => {
                    tracing::warn!("[ParticipantEnricher] Lookup task aborted: {}", e);
                    report.failed += 1;
                    continue;
                }
            };
            outstanding.remove(&id);

            match result {
                LookupResult::Found(document) => {
                    let profile = ParticipantProfile::from_document(&document, &self.default_avatar);
                    match lookup.merge(generation, &id, profile).await {
                        MergeOutcome::Inserted => {
                            report.merged += 1;
                            on_merge(&id);
                        }
                        MergeOutcome::Duplicate => {
                            tracing::debug!(
                                "[ParticipantEnricher] '{}' was already resolved, keeping first entry",
                                id
                            );
                        }
                        MergeOutcome::Stale => {
                            tracing::debug!(
                                "[ParticipantEnricher] Discarding profile '{}' from stale generation {}",
                                id,
                                generation.value()
                            );
                            report.discarded_stale += 1;
                        }
                    }
                }
                LookupResult::Missing => {
                    tracing::debug!("[ParticipantEnricher] No profile document for '{}'", id);
                    report.missing += 1;
                    lookup.release(generation, &id).await;
                }
                LookupResult::Failed(e) => {
                    tracing::warn!(
                        "[ParticipantEnricher] Profile lookup for '{}' failed, treating as missing: {}",
                        id,
                        e
                    );
                    report.failed += 1;
                    lookup.release(generation, &id).await;
                }
                LookupResult::Cancelled => {
                    report.cancelled += 1;
                    lookup.release(generation, &id).await;
                }
            }
        }

        // Tasks that panicked never reported their identifier.
        for id in outstanding {
            lookup.release(generation, &id).await;
        }

        tracing::debug!("[ParticipantEnricher] Pass finished: {:?}", report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use echec_core::error::Result;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    // Mock ProfileRepository counting lookups per identifier
    #[derive(Default)]
    struct MockProfileRepository {
        documents: Mutex<HashMap<String, UserDocument>>,
        failing: Mutex<HashSet<String>>,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockProfileRepository {
        fn with(documents: Vec<UserDocument>) -> Self {
            let repo = Self::default();
            {
                let mut map = repo.documents.lock().unwrap();
                for doc in documents {
                    map.insert(doc.id.clone(), doc);
                }
            }
            repo
        }

        fn fail(&self, id: &str) {
            self.failing.lock().unwrap().insert(id.to_string());
        }

        fn gate(&self, id: &str) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(id.to_string(), notify.clone());
            notify
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProfileRepository for MockProfileRepository {
        async fn find_by_id(&self, user_id: &str) -> Result<Option<UserDocument>> {
            self.calls.lock().unwrap().push(user_id.to_string());
            let gate = self.gates.lock().unwrap().get(user_id).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if self.failing.lock().unwrap().contains(user_id) {
                return Err(EchecError::data_access("permission denied"));
            }
            Ok(self.documents.lock().unwrap().get(user_id).cloned())
        }

        async fn update_field(&self, _user_id: &str, _field: &str, _value: Value) -> Result<()> {
            Ok(())
        }
    }

    /// One pass at the lookup's current generation, without cancellation.
    async fn enrich_all(
        enricher: &ParticipantEnricher,
        ids: &[String],
        lookup: &ParticipantLookup,
    ) -> EnrichmentReport {
        let generation = lookup.generation().await;
        enricher
            .enrich(ids, lookup, generation, &CancellationToken::new(), |_| {})
            .await
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_missing_profile_stays_absent() {
        let repo = Arc::new(MockProfileRepository::with(vec![
            UserDocument::new("B").with_field("username", json!("bob")),
        ]));
        let enricher = ParticipantEnricher::new(repo.clone(), "/image.png");
        let lookup = ParticipantLookup::new();

        let report = enrich_all(&enricher, &ids(&["A", "B"]), &lookup).await;

        assert_eq!(report.fetched, 2);
        assert_eq!(report.merged, 1);
        assert_eq!(report.missing, 1);
        assert!(!lookup.contains("A").await);
        let bob = lookup.get("B").await.unwrap();
        assert_eq!(bob.display_name("User"), "bob");
        assert_eq!(bob.avatar, "/image.png");
        assert_eq!(lookup.len().await, 1);
    }

    #[tokio::test]
    async fn test_second_pass_issues_no_fetches_for_cached_ids() {
        let repo = Arc::new(MockProfileRepository::with(vec![
            UserDocument::new("A").with_field("firstName", json!("Ann")),
            UserDocument::new("B").with_field("username", json!("bob")),
        ]));
        let enricher = ParticipantEnricher::new(repo.clone(), "/image.png");
        let lookup = ParticipantLookup::new();
        let wanted = ids(&["A", "B"]);

        enrich_all(&enricher, &wanted, &lookup).await;
        assert_eq!(repo.calls().len(), 2);

        let report = enrich_all(&enricher, &wanted, &lookup).await;
        assert_eq!(report.fetched, 0);
        assert_eq!(report.skipped_cached, 2);
        assert_eq!(repo.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_treated_as_missing() {
        let repo = Arc::new(MockProfileRepository::with(vec![
            UserDocument::new("A").with_field("username", json!("ann")),
            UserDocument::new("B").with_field("username", json!("bob")),
        ]));
        repo.fail("A");
        let enricher = ParticipantEnricher::new(repo.clone(), "/image.png");
        let lookup = ParticipantLookup::new();

        let report = enrich_all(&enricher, &ids(&["A", "B"]), &lookup).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.merged, 1);
        assert!(!lookup.contains("A").await);
        assert!(lookup.contains("B").await);
        assert_eq!(lookup.in_flight().await, 0);
    }

    #[tokio::test]
    async fn test_completions_merge_in_arrival_order() {
        let repo = Arc::new(MockProfileRepository::with(vec![
            UserDocument::new("A").with_field("username", json!("ann")),
            UserDocument::new("B").with_field("username", json!("bob")),
        ]));
        let gate_a = repo.gate("A");
        let enricher = ParticipantEnricher::new(repo.clone(), "/image.png");
        let lookup = Arc::new(ParticipantLookup::new());
        let generation = lookup.generation().await;
        let merged = Arc::new(Mutex::new(Vec::new()));

        let run = {
            let lookup = lookup.clone();
            let merged = merged.clone();
            async move {
                enricher
                    .enrich(
                        &ids(&["A", "B"]),
                        &lookup,
                        generation,
                        &CancellationToken::new(),
                        |id| merged.lock().unwrap().push(id.to_string()),
                    )
                    .await
            }
        };
        let release = async {
            // Let B complete while A is still blocked.
            while !lookup.contains("B").await {
                tokio::task::yield_now().await;
            }
            assert!(!lookup.contains("A").await);
            gate_a.notify_one();
        };

        let (report, _) = tokio::join!(run, release);
        assert_eq!(report.merged, 2);
        assert_eq!(*merged.lock().unwrap(), vec!["B".to_string(), "A".to_string()]);
    }

    #[tokio::test]
    async fn test_cancellation_releases_reservations() {
        let repo = Arc::new(MockProfileRepository::with(vec![
            UserDocument::new("A").with_field("username", json!("ann")),
        ]));
        let _gate = repo.gate("A");
        let enricher = ParticipantEnricher::new(repo.clone(), "/image.png");
        let lookup = ParticipantLookup::new();
        let generation = lookup.generation().await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = enricher
            .enrich(&ids(&["A"]), &lookup, generation, &cancel, |_| {})
            .await;

        assert_eq!(report.cancelled, 1);
        assert!(lookup.is_empty().await);
        assert_eq!(lookup.in_flight().await, 0);
    }

    #[tokio::test]
    async fn test_stale_generation_discards_completion() {
        let repo = Arc::new(MockProfileRepository::with(vec![
            UserDocument::new("A").with_field("username", json!("ann")),
        ]));
        let gate_a = repo.gate("A");
        let enricher = ParticipantEnricher::new(repo.clone(), "/image.png");
        let lookup = ParticipantLookup::new();
        let generation = lookup.generation().await;

        let wanted = ids(&["A"]);
        let cancel = CancellationToken::new();
        let run = enricher.enrich(&wanted, &lookup, generation, &cancel, |_| {});
        let switch = async {
            while repo.calls().is_empty() {
                tokio::task::yield_now().await;
            }
            lookup.advance_generation(true).await;
            gate_a.notify_one();
        };

        let (report, _) = tokio::join!(run, switch);
        assert_eq!(report.discarded_stale, 1);
        assert_eq!(report.merged, 0);
        assert!(lookup.is_empty().await);
    }

    #[tokio::test]
    async fn test_dropped_pass_does_not_strand_reservations() {
        let repo = Arc::new(MockProfileRepository::with(vec![
            UserDocument::new("A").with_field("username", json!("ann")),
        ]));
        let _gate = repo.gate("A");
        let enricher = ParticipantEnricher::new(repo.clone(), "/image.png");
        let lookup = ParticipantLookup::new();
        let wanted = ids(&["A"]);

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            enrich_all(&enricher, &wanted, &lookup),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(lookup.in_flight().await, 0);

        repo.gates.lock().unwrap().remove("A");
        let report = enrich_all(&enricher, &wanted, &lookup).await;
        assert_eq!(report.skipped_in_flight, 0);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.merged, 1);
        assert!(lookup.contains("A").await);
    }
}
