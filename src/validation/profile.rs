// SPDX-License-Identifier: GPL-3.0-only
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use crate::session::models::BackendProfile;

pub(crate) static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern is valid"));

pub(crate) static AADHAAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12}$").expect("aadhaar pattern is valid"));

/// Profile field required before booking accommodation or checking out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissingField {
    #[serde(rename = "NAME")]
    Name,
    #[serde(rename = "PHONE")]
    Phone,
    #[serde(rename = "GENDER")]
    Gender,
    #[serde(rename = "DOB")]
    Dob,
    #[serde(rename = "COLLEGE")]
    College,
    #[serde(rename = "STUDENT ID")]
    StudentId,
    #[serde(rename = "AADHAAR NUMBER")]
    AadhaarNumber,
    #[serde(rename = "AADHAAR IMAGE")]
    AadhaarImage,
    #[serde(rename = "STUDENT ID IMAGE")]
    StudentIdImage,
}

/// Checked in this order; reports keep it.
const REQUIRED_FIELDS: [MissingField; 9] = [
    MissingField::Name,
    MissingField::Phone,
    MissingField::Gender,
    MissingField::Dob,
    MissingField::College,
    MissingField::StudentId,
    MissingField::AadhaarNumber,
    MissingField::AadhaarImage,
    MissingField::StudentIdImage,
];

impl MissingField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::Phone => "PHONE",
            Self::Gender => "GENDER",
            Self::Dob => "DOB",
            Self::College => "COLLEGE",
            Self::StudentId => "STUDENT ID",
            Self::AadhaarNumber => "AADHAAR NUMBER",
            Self::AadhaarImage => "AADHAAR IMAGE",
            Self::StudentIdImage => "STUDENT ID IMAGE",
        }
    }

    /// Wire name of the profile field
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Gender => "gender",
            Self::Dob => "dob",
            Self::College => "collegeName",
            Self::StudentId => "studentId",
            Self::AadhaarNumber => "aadhaarNumber",
            Self::AadhaarImage => "aadhaarImage",
            Self::StudentIdImage => "studentIdImage",
        }
    }

    fn is_satisfied_by(self, value: &str) -> bool {
        match self {
            Self::Phone => PHONE_RE.is_match(value),
            Self::AadhaarNumber => AADHAAR_RE.is_match(value),
            _ => !value.is_empty(),
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Required fields that are empty or badly formatted, in declaration order
pub fn compute_missing_fields(profile: &BackendProfile) -> Vec<MissingField> {
    REQUIRED_FIELDS
        .into_iter()
        .filter(|field| !field.is_satisfied_by(&profile.field_text(field.key())))
        .collect()
}

/// Whether a user of `profile_gender` may book in a sector for `sector_gender`.
///
/// An empty value on either side does not block; the booking flow's own
/// checks catch incomplete profiles.
pub fn is_eligible_for_sector(profile_gender: &str, sector_gender: &str) -> bool {
    let profile_gender = profile_gender.trim();
    let sector_gender = sector_gender.trim();

    if profile_gender.is_empty() || sector_gender.is_empty() {
        return true;
    }

    profile_gender.to_lowercase() == sector_gender.to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum BookingDecision {
    Allowed,
    NoSession,
    ProfileIncomplete { missing: Vec<MissingField> },
    GenderMismatch { profile_gender: String },
}

/// Gate in front of accommodation booking
pub fn check_booking(profile: Option<&BackendProfile>, sector_gender: &str) -> BookingDecision {
    let Some(profile) = profile else {
        return BookingDecision::NoSession;
    };

    let missing = compute_missing_fields(profile);
    if !missing.is_empty() {
        return BookingDecision::ProfileIncomplete { missing };
    }

    let profile_gender = profile.field_text("gender");
    if !is_eligible_for_sector(&profile_gender, sector_gender) {
        return BookingDecision::GenderMismatch {
            profile_gender: profile_gender.to_lowercase(),
        };
    }

    BookingDecision::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: serde_json::Value) -> BackendProfile {
        serde_json::from_value(value).unwrap()
    }

    fn complete_profile() -> BackendProfile {
        profile(json!({
            "_id": "u1",
            "name": "Asha",
            "phone": "9876543210",
            "gender": "Female",
            "dob": "2003-04-05",
            "collegeName": "NIT",
            "studentId": "21CS001",
            "aadhaarNumber": 123456789012u64,
            "aadhaarImage": "https://cdn.example.com/a.png",
            "studentIdImage": "https://cdn.example.com/s.png"
        }))
    }

    #[test]
    fn test_missing_fields_reports_bad_phone_not_aadhaar() {
        let partial = profile(json!({
            "name": "",
            "phone": "12345",
            "aadhaarNumber": "123456789012"
        }));

        let missing = compute_missing_fields(&partial);

        assert_eq!(
            missing,
            vec![
                MissingField::Name,
                MissingField::Phone,
                MissingField::Gender,
                MissingField::Dob,
                MissingField::College,
                MissingField::StudentId,
                MissingField::AadhaarImage,
                MissingField::StudentIdImage,
            ]
        );
        assert!(!missing.contains(&MissingField::AadhaarNumber));
    }

    #[test]
    fn test_complete_profile_has_no_missing_fields() {
        assert!(compute_missing_fields(&complete_profile()).is_empty());
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut p = complete_profile();
        p.extra.insert("collegeName".to_string(), json!("   "));
        p.extra.insert("phone".to_string(), json!(" 98765 43210 "));

        assert_eq!(compute_missing_fields(&p), vec![MissingField::Phone, MissingField::College]);
    }

    #[test]
    fn test_empty_profile_reports_everything() {
        assert_eq!(compute_missing_fields(&BackendProfile::default()).len(), 9);
    }

    #[test]
    fn test_labels_serialize() {
        let json = serde_json::to_value(vec![MissingField::StudentIdImage, MissingField::Name]).unwrap();
        assert_eq!(json, json!(["STUDENT ID IMAGE", "NAME"]));
        assert_eq!(MissingField::AadhaarNumber.to_string(), "AADHAAR NUMBER");
    }

    #[test]
    fn test_sector_eligibility() {
        assert!(!is_eligible_for_sector("male", "female"));
        assert!(is_eligible_for_sector("", "female"));
        assert!(is_eligible_for_sector("male", ""));
        assert!(is_eligible_for_sector("MALE", "male"));
        assert!(is_eligible_for_sector(" Female ", "female"));
    }

    #[test]
    fn test_booking_without_session() {
        assert_eq!(check_booking(None, "male"), BookingDecision::NoSession);
    }

    #[test]
    fn test_booking_incomplete_profile() {
        let partial = profile(json!({ "_id": "u1", "name": "Asha" }));
        match check_booking(Some(&partial), "female") {
            BookingDecision::ProfileIncomplete { missing } => {
                assert_eq!(missing.first(), Some(&MissingField::Phone));
            }
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn test_booking_gender_mismatch() {
        let decision = check_booking(Some(&complete_profile()), "male");
        assert_eq!(
            decision,
            BookingDecision::GenderMismatch { profile_gender: "female".to_string() }
        );
    }

    #[test]
    fn test_booking_allowed() {
        assert_eq!(check_booking(Some(&complete_profile()), "FEMALE"), BookingDecision::Allowed);
    }

    #[test]
    fn test_booking_decision_json() {
        let json = serde_json::to_value(BookingDecision::GenderMismatch {
            profile_gender: "male".to_string(),
        })
        .unwrap();
        assert_eq!(json, json!({ "decision": "gender_mismatch", "profile_gender": "male" }));
    }
}
