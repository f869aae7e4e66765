// SPDX-License-Identifier: GPL-3.0-only
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use crate::session::models::{value_text, BackendProfile};
use crate::validation::dob::{is_valid_dob_input, normalize_dob_for_input, to_api_dob};
use crate::validation::profile::{AADHAAR_RE, PHONE_RE};

/// Profile fields the edit form may change
pub const EDITABLE_FIELDS: [&str; 9] = [
    "name",
    "phone",
    "gender",
    "dob",
    "collegeName",
    "studentId",
    "aadhaarNumber",
    "aadhaarImage",
    "studentIdImage",
];

const CANNOT_BE_EMPTIED: &str = "Cannot be emptied";

/// Outcome of diffing an edited profile against the saved one
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProfileChanges {
    /// Fields to send, already in wire format
    pub changes: Map<String, Value>,

    /// Format errors, field name to user-facing message. Any of these blocks the edit.
    pub errors: BTreeMap<String, String>,

    /// Fields the user emptied. They keep their saved value and never block
    /// the other changes.
    pub cleared: Vec<String>,
}

impl ProfileChanges {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Every message to show next to a field, cleared fields included
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let mut messages: BTreeMap<String, String> = self
            .cleared
            .iter()
            .map(|key| (key.clone(), CANNOT_BE_EMPTIED.to_string()))
            .collect();
        messages.extend(self.errors.clone());
        messages
    }
}

/// Diff `edited` against `saved`, validating every changed field.
/// Keys outside [`EDITABLE_FIELDS`] are ignored.
pub fn validate_profile_changes(saved: &BackendProfile, edited: &Map<String, Value>) -> ProfileChanges {
    let mut result = ProfileChanges::default();

    for (key, value) in edited {
        if !EDITABLE_FIELDS.contains(&key.as_str()) {
            continue;
        }

        let new_text = value_text(value);
        let old_text = match key.as_str() {
            "dob" => normalize_dob_for_input(&saved.field_text(key)),
            _ => saved.field_text(key),
        };

        if new_text == old_text {
            continue;
        }

        if new_text.is_empty() {
            result.cleared.push(key.clone());
            continue;
        }

        let mut cleaned = match value {
            Value::String(_) => Value::String(new_text.clone()),
            other => other.clone(),
        };

        match key.as_str() {
            "phone" if !PHONE_RE.is_match(&new_text) => {
                result.errors.insert(key.clone(), "Enter a valid 10-digit number".to_string());
                continue;
            }
            "aadhaarNumber" if !AADHAAR_RE.is_match(&new_text) => {
                result.errors.insert(key.clone(), "Enter a valid 12-digit number".to_string());
                continue;
            }
            "dob" => {
                if !is_valid_dob_input(&new_text) {
                    result.errors.insert(key.clone(), "Use DD/MM/YYYY format".to_string());
                    continue;
                }
                cleaned = Value::String(to_api_dob(&new_text));
            }
            _ => {}
        }

        result.changes.insert(key.clone(), cleaned);
    }

    result
}
