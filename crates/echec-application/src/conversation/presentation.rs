//! Join of conversation summaries with resolved participant profiles.

use echec_core::config::ConversationSettings;
use echec_core::conversation::ConversationSummary;
use echec_core::participant::ParticipantProfile;
use serde::Serialize;
use std::collections::HashMap;

/// A conversation list entry ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationRow {
    pub conversation_id: String,
    pub other_participant_id: String,
    pub avatar: String,
    pub display_name: String,
    /// Whether the counterpart's profile has been resolved
    pub resolved: bool,
}

impl ConversationRow {
    /// Label of the list entry.
    pub fn headline(&self) -> String {
        format!("Conversation avec {}", self.display_name)
    }

    /// Route of the chat view for this conversation.
    pub fn link(&self) -> String {
        format!("/chat/{}", self.conversation_id)
    }
}

/// Joins every summary with the lookup entry of its counterpart.
///
/// Unresolved counterparts render with the default avatar and the fallback
/// label. The result is rebuilt on every call.
pub fn join_rows(
    summaries: &[ConversationSummary],
    lookup: &HashMap<String, ParticipantProfile>,
    settings: &ConversationSettings,
) -> Vec<ConversationRow> {
    summaries
        .iter()
        .map(|summary| {
            let profile = lookup.get(&summary.other_participant_id);
            ConversationRow {
                conversation_id: summary.conversation_id.clone(),
                other_participant_id: summary.other_participant_id.clone(),
                avatar: profile
                    .map(|p| p.avatar.clone())
                    .unwrap_or_else(|| settings.default_avatar.clone()),
                display_name: profile
                    .map(|p| p.display_name(&settings.fallback_label))
                    .unwrap_or(&settings.fallback_label)
                    .to_string(),
                resolved: profile.is_some(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use echec_core::profile::UserDocument;
    use serde_json::{Map, json};

    fn summary(conversation_id: &str, other: &str) -> ConversationSummary {
        ConversationSummary {
            conversation_id: conversation_id.to_string(),
            other_participant_id: other.to_string(),
            fields: Map::new(),
        }
    }

    #[test]
    fn test_unresolved_counterpart_uses_placeholders() {
        let settings = ConversationSettings::default();
        let mut lookup = HashMap::new();
        lookup.insert(
            "B".to_string(),
            ParticipantProfile::from_document(
                &UserDocument::new("B").with_field("username", json!("bob")),
                &settings.default_avatar,
            ),
        );

        let rows = join_rows(&[summary("c1", "A"), summary("c2", "B")], &lookup, &settings);

        assert_eq!(rows[0].display_name, "User");
        assert_eq!(rows[0].avatar, "/image.png");
        assert!(!rows[0].resolved);
        assert_eq!(rows[0].headline(), "Conversation avec User");
        assert_eq!(rows[1].display_name, "bob");
        assert!(rows[1].resolved);
        assert_eq!(rows[1].link(), "/chat/c2");
    }

    #[test]
    fn test_rejoin_reflects_new_entries() {
        let settings = ConversationSettings::default();
        let summaries = vec![summary("c1", "A")];
        let mut lookup = HashMap::new();

        assert!(!join_rows(&summaries, &lookup, &settings)[0].resolved);

        lookup.insert(
            "A".to_string(),
            ParticipantProfile::from_document(
                &UserDocument::new("A")
                    .with_field("firstName", json!("Ann"))
                    .with_field("avatar", json!("https://cdn/ann.png")),
                &settings.default_avatar,
            ),
        );
        let rows = join_rows(&summaries, &lookup, &settings);
        assert_eq!(rows[0].display_name, "Ann");
        assert_eq!(rows[0].avatar, "https://cdn/ann.png");
    }

    #[test]
    fn test_custom_fallback_label() {
        let settings = ConversationSettings {
            fallback_label: "Joueur".to_string(),
            ..Default::default()
        };
        let rows = join_rows(&[summary("c1", "A")], &HashMap::new(), &settings);
        assert_eq!(rows[0].display_name, "Joueur");
    }
}
