use serde::{Deserialize, Serialize};

/// How far participant enrichment has progressed for the current list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentProgress {
    Partial,
    Complete,
}

/// Lifecycle of the conversation list for one signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nobody is signed in; the list is empty.
    Unauthenticated,
    /// The conversation query for `user_id` is running.
    Fetching { user_id: String },
    /// Summaries are available; profiles may still be arriving.
    Ready {
        user_id: String,
        enrichment: EnrichmentProgress,
    },
    /// The conversation query was rejected. The list is empty and a
    /// refresh may be attempted.
    Failed { user_id: String, message: String },
}

/// Signals published to the presentation layer.
///
/// Subscribers re-join the summary list with the participant lookup on
/// `SummariesChanged` and `LookupChanged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    StateChanged { phase: SessionPhase },
    SummariesChanged { user_id: Option<String>, count: usize },
    LookupChanged { participant_id: Option<String> },
    FetchFailed { user_id: String, message: String },
}

impl ConversationEvent {
    /// Whether a listener rendering the list has to re-join.
    pub fn requires_rejoin(&self) -> bool {
        matches!(
            self,
            ConversationEvent::SummariesChanged { .. } | ConversationEvent::LookupChanged { .. }
        )
    }
}
