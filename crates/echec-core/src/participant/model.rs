use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::profile::UserDocument;

/// Display data for the other side of a conversation.
///
/// `avatar` is always resolved: documents without a usable avatar get the
/// default placeholder when the profile is built, so cached entries never
/// need defaulting again at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub avatar: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    /// Remaining document payload
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ParticipantProfile {
    /// Builds a profile from a user document, substituting `default_avatar`
    /// when the document has none.
    pub fn from_document(document: &UserDocument, default_avatar: &str) -> Self {
        let mut fields = document.fields.clone();
        fields.remove("avatar");
        fields.remove("username");
        fields.remove("firstName");

        Self {
            avatar: document
                .text("avatar")
                .unwrap_or(default_avatar)
                .to_string(),
            username: document.text("username").map(str::to_string),
            first_name: document.text("firstName").map(str::to_string),
            fields,
        }
    }

    /// Name shown in the list: username, else first name, else `fallback`.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.first_name.as_deref().filter(|name| !name.is_empty()))
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_avatar_defaults_at_build_time() {
        let doc = UserDocument::new("B").with_field("username", json!("bob"));
        let profile = ParticipantProfile::from_document(&doc, "/image.png");
        assert_eq!(profile.avatar, "/image.png");
        assert_eq!(profile.display_name("User"), "bob");
    }

    #[test]
    fn test_empty_avatar_counts_as_missing() {
        let doc = UserDocument::new("B").with_field("avatar", json!(""));
        let profile = ParticipantProfile::from_document(&doc, "/image.png");
        assert_eq!(profile.avatar, "/image.png");
    }

    #[test]
    fn test_display_name_precedence() {
        let both = UserDocument::new("A")
            .with_field("username", json!("alice"))
            .with_field("firstName", json!("Alice"))
            .with_field("avatar", json!("https://cdn/a.png"));
        let first_only = UserDocument::new("A").with_field("firstName", json!("Alice"));
        let neither = UserDocument::new("A").with_field("email", json!("a@x.org"));

        let p = ParticipantProfile::from_document(&both, "/image.png");
        assert_eq!(p.display_name("User"), "alice");
        assert_eq!(p.avatar, "https://cdn/a.png");
        assert_eq!(
            ParticipantProfile::from_document(&first_only, "/image.png").display_name("User"),
            "Alice"
        );
        let p = ParticipantProfile::from_document(&neither, "/image.png");
        assert_eq!(p.display_name("User"), "User");
        assert_eq!(p.fields.get("email"), Some(&json!("a@x.org")));
    }
}
