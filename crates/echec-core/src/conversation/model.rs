//! Conversation documents and the summaries derived from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EchecError, Result};

/// A conversation document as returned by the store.
///
/// `participants` always holds two user identifiers in well-formed data.
/// Every other key of the document lands in `fields` and is carried through
/// to the summary untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Store-assigned document identifier, empty until the store assigns one
    #[serde(default)]
    pub id: String,
    /// User identifiers taking part in the conversation
    #[serde(default)]
    pub participants: Vec<String>,
    /// Remaining document payload
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ConversationRecord {
    pub fn new(id: impl Into<String>, participants: [&str; 2]) -> Self {
        Self {
            id: id.into(),
            participants: participants.iter().map(|p| p.to_string()).collect(),
            fields: Map::new(),
        }
    }

    /// Attaches a passthrough field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Resolves the participant that is not `user_id`.
    ///
    /// The record must list `user_id` and exactly one distinct other
    /// identifier; anything else is a [`EchecError::MalformedRecord`].
    pub fn other_participant(&self, user_id: &str) -> Result<&str> {
        if !self.participants.iter().any(|p| p == user_id) {
            return Err(EchecError::malformed(
                &self.id,
                format!("user '{}' is not a participant", user_id),
            ));
        }

        let mut other: Option<&str> = None;
        for participant in self.participants.iter().map(String::as_str) {
            if participant == user_id {
                continue;
            }
            match other {
                None => other = Some(participant),
                Some(existing) if existing == participant => {}
                Some(_) => {
                    return Err(EchecError::malformed(
                        &self.id,
                        "more than one counterpart",
                    ));
                }
            }
        }

        other.ok_or_else(|| EchecError::malformed(&self.id, "no counterpart"))
    }
}

/// One row of the conversation list before participant enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub other_participant_id: String,
    /// Passthrough payload of the originating record
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ConversationSummary {
    /// Builds the summary for `record` as seen by `user_id`.
    pub fn from_record(record: &ConversationRecord, user_id: &str) -> Result<Self> {
        let other = record.other_participant(user_id)?;
        Ok(Self {
            conversation_id: record.id.clone(),
            other_participant_id: other.to_string(),
            fields: record.fields.clone(),
        })
    }
}
