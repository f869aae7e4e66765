// SPDX-License-Identifier: GPL-3.0-only
//! Date-of-birth helpers. Users type `DD/MM/YYYY`; the backend stores `YYYY-MM-DD`.
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;

static INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("dob input pattern is valid"));

static API_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("dob api pattern is valid"));

/// `DD/MM/YYYY` naming a real calendar day between 1900 and this year
pub fn is_valid_dob_input(value: &str) -> bool {
    let Some(caps) = INPUT_RE.captures(value) else {
        return false;
    };

    let (Ok(day), Ok(month), Ok(year)) = (
        caps[1].parse::<u32>(),
        caps[2].parse::<u32>(),
        caps[3].parse::<i32>(),
    ) else {
        return false;
    };

    if !(1900..=Utc::now().year()).contains(&year) {
        return false;
    }

    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// `DD/MM/YYYY` to `YYYY-MM-DD`; anything else is returned unchanged
pub fn to_api_dob(value: &str) -> String {
    match INPUT_RE.captures(value) {
        Some(caps) => format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]),
        None => value.to_string(),
    }
}

/// Render a stored date of birth the way the edit form shows it
pub fn normalize_dob_for_input(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if API_PREFIX_RE.is_match(trimmed) {
        let (year, rest) = trimmed.split_at(4);
        return format!("{}/{}/{}", &rest[4..6], &rest[1..3], year);
    }

    if INPUT_RE.is_match(trimmed) {
        return trimmed.to_string();
    }

    group_digits(trimmed)
}

/// Regroup up to eight digits as a partial `DD/MM/YYYY`
fn group_digits(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).take(8).collect();

    let mut formatted = match digits.len() {
        0..=2 => digits.clone(),
        3..=4 => format!("{}/{}", &digits[..2], &digits[2..]),
        _ => format!("{}/{}/{}", &digits[..2], &digits[2..4], &digits[4..]),
    };

    if digits.len() == 2 || digits.len() == 4 {
        formatted.push('/');
    }

    formatted
}
