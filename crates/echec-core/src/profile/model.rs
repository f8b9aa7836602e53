//! User profile documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw document from the user collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UserDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Returns a string field, treating empty strings and non-strings as
    /// absent.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Fields of a profile the owner can edit one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Email,
    LastName,
    FirstName,
    Genre,
    DateOfBirth,
}

impl ProfileField {
    pub const ALL: [ProfileField; 5] = [
        ProfileField::Email,
        ProfileField::LastName,
        ProfileField::FirstName,
        ProfileField::Genre,
        ProfileField::DateOfBirth,
    ];

    /// Key of the field inside the stored document.
    pub fn document_key(self) -> &'static str {
        match self {
            ProfileField::Email => "email",
            ProfileField::LastName => "lastName",
            ProfileField::FirstName => "firstName",
            ProfileField::Genre => "genre",
            ProfileField::DateOfBirth => "dob",
        }
    }

    /// Label shown next to the value on the profile page.
    pub fn label(self) -> &'static str {
        match self {
            ProfileField::Email => "E-Mail",
            ProfileField::LastName => "Nom",
            ProfileField::FirstName => "Prénom",
            ProfileField::Genre => "Genre",
            ProfileField::DateOfBirth => "Date de naissance",
        }
    }
}

impl std::str::FromStr for ProfileField {
    type Err = crate::error::EchecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileField::ALL
            .into_iter()
            .find(|field| {
                field.document_key().eq_ignore_ascii_case(s)
                    || serde_json::to_value(field)
                        .ok()
                        .and_then(|v| v.as_str().map(|name| name == s))
                        .unwrap_or(false)
            })
            .ok_or_else(|| {
                crate::error::EchecError::validation(format!("'{}' is not an editable field", s))
            })
    }
}

/// The signed-in user's own profile as shown on the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub genre: Option<String>,
    pub date_of_birth: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub games: Vec<String>,
}

impl UserProfile {
    pub fn from_document(document: &UserDocument) -> Self {
        let text = |key: &str| document.text(key).map(str::to_string);
        let games = document
            .fields
            .get("games")
            .and_then(Value::as_array)
            .map(|games| {
                games
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: document.id.clone(),
            username: text("username"),
            email: text(ProfileField::Email.document_key()),
            first_name: text(ProfileField::FirstName.document_key()),
            last_name: text(ProfileField::LastName.document_key()),
            genre: text(ProfileField::Genre.document_key()),
            date_of_birth: text(ProfileField::DateOfBirth.document_key()),
            avatar: text("avatar"),
            games,
        }
    }

    pub fn field(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::Email => self.email.as_deref(),
            ProfileField::LastName => self.last_name.as_deref(),
            ProfileField::FirstName => self.first_name.as_deref(),
            ProfileField::Genre => self.genre.as_deref(),
            ProfileField::DateOfBirth => self.date_of_birth.as_deref(),
        }
    }
}
