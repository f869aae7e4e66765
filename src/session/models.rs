// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity assertion issued by the external identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(default)]
    pub display_name: String,

    pub email: String,

    #[serde(default, rename = "photoURL", alias = "photoUrl")]
    pub photo_url: Option<String>,
}

/// Canonical user record owned by the festival backend.
///
/// Only the identity fields are typed. Everything else the backend sends
/// (phone, gender, dob, collegeName, studentId, aadhaarNumber, images, role,
/// ...) rides along in `extra` and is written back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendProfile {
    /// Server-issued identifier; present only once the backend created the record
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,

    #[serde(default)]
    pub email_verified: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BackendProfile {
    /// A profile is synced iff it carries a non-empty server id
    pub fn is_synced(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }

    /// Text form of a field, looked up by its wire name.
    ///
    /// Strings are trimmed, numbers and booleans rendered as text, null or
    /// missing fields come back empty.
    pub fn field_text(&self, key: &str) -> String {
        match key {
            "_id" | "id" => self.id.clone().unwrap_or_default().trim().to_string(),
            "email" => self.email.trim().to_string(),
            "name" => self.name.trim().to_string(),
            "profilePic" => self.profile_pic.clone().unwrap_or_default().trim().to_string(),
            "emailVerified" => self.email_verified.to_string(),
            _ => self.extra.get(key).map(value_text).unwrap_or_default(),
        }
    }

    /// Overlay `fields` onto this profile. Known keys update the typed
    /// fields, everything else lands in `extra`.
    pub fn merge_fields(&mut self, fields: &Map<String, Value>) {
        for (key, value) in fields {
            match key.as_str() {
                "_id" | "id" => {
                    if let Some(id) = value.as_str().filter(|id| !id.trim().is_empty()) {
                        self.id = Some(id.to_string());
                    }
                }
                "email" => self.email = value_text(value),
                "name" => self.name = value_text(value),
                "profilePic" => {
                    let pic = value_text(value);
                    self.profile_pic = (!pic.is_empty()).then_some(pic);
                }
                "emailVerified" => self.email_verified = value.as_bool().unwrap_or(false),
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

/// Text form of a JSON scalar
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Body of the backend's create-or-get user call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,

    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl From<&Credential> for NewUser {
    fn from(credential: &Credential) -> Self {
        let name = credential.display_name.trim();
        Self {
            name: if name.is_empty() { "Unknown".to_string() } else { name.to_string() },
            email: credential.email.clone(),
            profile_pic: credential.photo_url.clone(),
            email_verified: None,
        }
    }
}
