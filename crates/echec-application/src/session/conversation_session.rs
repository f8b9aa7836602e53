use chrono::{DateTime, Utc};
use echec_core::EchecError;
use echec_core::config::{ConversationSettings, LookupRetention};
use echec_core::conversation::{
    ConversationEvent, ConversationRepository, ConversationSummary, EnrichmentProgress,
    SessionPhase,
};
use echec_core::profile::ProfileRepository;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;

use crate::conversation::{ConversationFetcher, ConversationRow, join_rows};
use crate::participant::{EnrichmentReport, ParticipantEnricher, ParticipantLookup};

/// How a fetch cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Nobody is signed in; nothing was fetched.
    Unauthenticated,
    Completed {
        summaries: usize,
        skipped: usize,
        enrichment: EnrichmentReport,
    },
    /// The conversation query was rejected. The session is in the
    /// `Failed` phase and can be refreshed.
    Failed(EchecError),
    /// Identity changed or a newer cycle started before this one finished;
    /// its results were discarded.
    Stale,
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub summaries: Vec<ConversationSummary>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

struct SessionInner {
    user_id: Option<String>,
    phase: SessionPhase,
    summaries: Vec<ConversationSummary>,
    /// Incremented for every cycle; only the latest cycle publishes.
    cycle: u64,
    /// Cancelled whenever the identity changes.
    cancel: CancellationToken,
    refreshed_at: Option<DateTime<Utc>>,
}

impl SessionInner {
    /// Whether a cycle started as `cycle` for `user_id` may still publish.
    fn is_current(&self, cycle: u64, user_id: &str, cancel: &CancellationToken) -> bool {
        self.cycle == cycle && !cancel.is_cancelled() && self.user_id.as_deref() == Some(user_id)
    }
}

/// Conversation list of the signed-in user.
///
/// Drives `Unauthenticated → Fetching → Ready(partial) → Ready(complete)`.
/// A cycle runs the conversation query to completion, publishes the
/// summaries, then enriches counterparts concurrently, publishing a
/// `LookupChanged` event for each resolved profile.
pub struct ConversationSession {
    fetcher: ConversationFetcher,
    enricher: ParticipantEnricher,
    lookup: Arc<ParticipantLookup>,
    settings: ConversationSettings,
    state: RwLock<SessionInner>,
    events: broadcast::Sender<ConversationEvent>,
}

impl ConversationSession {
    /// Creates an unauthenticated session over the given stores.
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        profiles: Arc<dyn ProfileRepository>,
        settings: ConversationSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        Self {
            fetcher: ConversationFetcher::new(conversations),
            enricher: ParticipantEnricher::new(profiles, settings.default_avatar.clone()),
            lookup: Arc::new(ParticipantLookup::new()),
            settings,
            state: RwLock::new(SessionInner {
                user_id: None,
                phase: SessionPhase::Unauthenticated,
                summaries: Vec::new(),
                cycle: 0,
                cancel: CancellationToken::new(),
                refreshed_at: None,
            }),
            events,
        }
    }

    /// Subscribes to state, summary and lookup changes.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    /// Subscribes to re-joined rows.
    pub fn watch_rows(&self) -> RowSubscription<'_> {
        RowSubscription {
            session: self,
            receiver: self.subscribe(),
        }
    }

    pub fn lookup(&self) -> Arc<ParticipantLookup> {
        self.lookup.clone()
    }

    pub async fn current_user(&self) -> Option<String> {
        self.state.read().await.user_id.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.state.read().await.user_id.is_some()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase.clone()
    }

    pub async fn summaries(&self) -> Vec<ConversationSummary> {
        self.state.read().await.summaries.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.state.read().await;
        SessionSnapshot {
            phase: inner.phase.clone(),
            summaries: inner.summaries.clone(),
            refreshed_at: inner.refreshed_at,
        }
    }

    /// Joins the current summaries with the current lookup.
    pub async fn rows(&self) -> Vec<ConversationRow> {
        let summaries = self.summaries().await;
        let lookup = self.lookup.snapshot().await;
        join_rows(&summaries, &lookup, &self.settings)
    }

    /// Switches the session to `user_id` and runs a fetch cycle.
    ///
    /// Signing in as the user already signed in behaves like
    /// [`ConversationSession::refresh`].
    pub async fn sign_in(&self, user_id: &str) -> CycleOutcome {
        {
            let mut inner = self.state.write().await;
            if inner.user_id.as_deref() != Some(user_id) {
                tracing::info!("[ConversationSession] Signed in as {}", user_id);
                inner.cancel.cancel();
                inner.cancel = CancellationToken::new();
                inner.cycle += 1;
                inner.user_id = Some(user_id.to_string());
                inner.summaries.clear();
                inner.refreshed_at = None;
                self.lookup
                    .advance_generation(self.clears_on_identity_change())
                    .await;
            }
        }
        self.run_cycle().await
    }

    /// Re-runs the fetch cycle for the current identity.
    pub async fn refresh(&self) -> CycleOutcome {
        self.run_cycle().await
    }

    /// Clears the identity and the list, abandoning in-flight work.
    ///
    /// Cached profiles are dropped or kept according to the configured
    /// [`LookupRetention`].
    pub async fn sign_out(&self) {
        let mut inner = self.state.write().await;
        if inner.user_id.is_none() {
            return;
        }

        tracing::info!(
            "[ConversationSession] Signing out {}",
            inner.user_id.as_deref().unwrap_or_default()
        );
        inner.cancel.cancel();
        inner.cancel = CancellationToken::new();
        inner.user_id = None;
        inner.summaries.clear();
        inner.refreshed_at = None;
        inner.cycle += 1;
        inner.phase = SessionPhase::Unauthenticated;

        let clear = self.clears_on_identity_change();
        self.lookup.advance_generation(clear).await;

        self.emit(ConversationEvent::StateChanged {
            phase: SessionPhase::Unauthenticated,
        });
        self.emit(ConversationEvent::SummariesChanged {
            user_id: None,
            count: 0,
        });
        if clear {
            self.emit(ConversationEvent::LookupChanged {
                participant_id: None,
            });
        }
    }

    fn clears_on_identity_change(&self) -> bool {
        self.settings.lookup_retention == LookupRetention::ClearOnSignOut
    }

    fn emit(&self, event: ConversationEvent) {
        // No receivers is not an error.
        let _ = self.events.send(event);
    }

    async fn run_cycle(&self) -> CycleOutcome {
        let (user_id, cycle, cancel, generation) = {
            let mut inner = self.state.write().await;
            let Some(user_id) = inner.user_id.clone() else {
                tracing::debug!("[ConversationSession] No identity, skipping fetch");
                return CycleOutcome::Unauthenticated;
            };
            inner.cycle += 1;
            inner.phase = SessionPhase::Fetching {
                user_id: user_id.clone(),
            };
            self.emit(ConversationEvent::StateChanged {
                phase: inner.phase.clone(),
            });
            // Read under the state lock so a concurrent sign-out cannot slip
            // between the identity and the generation.
            let generation = self.lookup.generation().await;
            (user_id, inner.cycle, inner.cancel.clone(), generation)
        };

        let fetched = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("[ConversationSession] Fetch for {} cancelled", user_id);
                return CycleOutcome::Stale;
            }
            fetched = self.fetcher.fetch(&user_id) => fetched,
        };

        let outcome = {
            let mut inner = self.state.write().await;
            if !inner.is_current(cycle, &user_id, &cancel) {
                tracing::debug!(
                    "[ConversationSession] Discarding results of superseded cycle {}",
                    cycle
                );
                return CycleOutcome::Stale;
            }

            match fetched {
                Ok(outcome) => {
                    inner.summaries = outcome.summaries.clone();
                    inner.refreshed_at = Some(Utc::now());
                    inner.phase = SessionPhase::Ready {
                        user_id: user_id.clone(),
                        enrichment: EnrichmentProgress::Partial,
                    };
                    self.emit(ConversationEvent::SummariesChanged {
                        user_id: Some(user_id.clone()),
                        count: inner.summaries.len(),
                    });
                    self.emit(ConversationEvent::StateChanged {
                        phase: inner.phase.clone(),
                    });
                    outcome
                }
                Err(e) => {
                    tracing::warn!(
                        "[ConversationSession] Conversation query for {} failed: {}",
                        user_id,
                        e
                    );
                    inner.summaries.clear();
                    inner.phase = SessionPhase::Failed {
                        user_id: user_id.clone(),
                        message: e.to_string(),
                    };
                    self.emit(ConversationEvent::FetchFailed {
                        user_id: user_id.clone(),
                        message: e.to_string(),
                    });
                    self.emit(ConversationEvent::SummariesChanged {
                        user_id: Some(user_id.clone()),
                        count: 0,
                    });
                    self.emit(ConversationEvent::StateChanged {
                        phase: inner.phase.clone(),
                    });
                    return CycleOutcome::Failed(e);
                }
            }
        };

        let report = self
            .enricher
            .enrich(
                &outcome.counterpart_ids,
                &self.lookup,
                generation,
                &cancel,
                |participant_id| {
                    self.emit(ConversationEvent::LookupChanged {
                        participant_id: Some(participant_id.to_string()),
                    })
                },
            )
            .await;

        let mut inner = self.state.write().await;
        if !inner.is_current(cycle, &user_id, &cancel) {
            return CycleOutcome::Stale;
        }
        inner.phase = SessionPhase::Ready {
            user_id: user_id.clone(),
            enrichment: EnrichmentProgress::Complete,
        };
        self.emit(ConversationEvent::StateChanged {
            phase: inner.phase.clone(),
        });

        tracing::info!(
            "[ConversationSession] {} conversations for {}, {} profiles resolved",
            outcome.summaries.len(),
            user_id,
            report.merged
        );

        CycleOutcome::Completed {
            summaries: outcome.summaries.len(),
            skipped: outcome.skipped.len(),
            enrichment: report,
        }
    }
}

/// Re-joined rows delivered whenever the summaries or the lookup change.
pub struct RowSubscription<'a> {
    session: &'a ConversationSession,
    receiver: broadcast::Receiver<ConversationEvent>,
}

impl RowSubscription<'_> {
    /// Waits for the next change and returns the rows as they are now.
    ///
    /// Returns `None` once the session is gone.
    pub async fn next(&mut self) -> Option<Vec<ConversationRow>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.requires_rejoin() => return Some(self.session.rows().await),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("[RowSubscription] Lagged by {} events, re-joining", skipped);
                    return Some(self.session.rows().await);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "conversation_session_test.rs"]
mod tests;
