//! Field-level value checks used by the entity rule sets.
//!
//! Every check takes the raw cell value and returns a human-readable
//! rejection message on failure. Inputs are length-bounded before any regex
//! runs, and the patterns themselves use bounded quantifiers.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of an email address (RFC 5321 transport limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum raw length accepted for a project key before normalization.
pub const MAX_PROJECT_KEY_INPUT_LENGTH: usize = 64;

/// Project keys after uppercasing: a letter followed by 1-9 letters/digits.
pub const PROJECT_KEY_PATTERN: &str = r"^[A-Z][A-Z0-9]{1,9}$";

/// Deliberately lenient email shape check. Imports deal with directory
/// exports, not RFC-compliant address grammar.
pub const EMAIL_PATTERN: &str = r"^[^\s@]{1,64}@[^\s@]{1,255}\.[A-Za-z]{2,24}$";

/// Date format accepted alongside RFC 3339 timestamps.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static PROJECT_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PROJECT_KEY_PATTERN).expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse an estimate value. Accepts anything `f64` does.
pub fn parse_estimate(value: &str) -> Option<f64> {
    value.parse::<f64>().ok()
}

/// Parse a date cell: `YYYY-MM-DD` first, then full RFC 3339.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Canonical form of a project key: trimmed and uppercased. Applied before
/// validation, storage, and uniqueness comparison.
pub fn normalize_project_key(value: &str) -> String {
    value.trim().to_uppercase()
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Check that a value parses as a number.
pub fn check_numeric(value: &str) -> Result<(), String> {
    if parse_estimate(value).is_some() {
        Ok(())
    } else {
        Err(format!("'{value}' is not a number"))
    }
}

/// Check that a value parses as a date.
pub fn check_date(value: &str) -> Result<(), String> {
    if parse_date(value).is_some() {
        Ok(())
    } else {
        Err(format!("'{value}' is not a valid date (expected YYYY-MM-DD)"))
    }
}

/// Check that a value looks like an email address.
pub fn check_email(value: &str) -> Result<(), String> {
    if value.len() > MAX_EMAIL_LENGTH {
        return Err(format!(
            "Email exceeds maximum length of {MAX_EMAIL_LENGTH} characters"
        ));
    }
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(format!("'{value}' is not a valid email address"))
    }
}

/// Check that a value normalizes to a well-formed project key.
pub fn check_project_key(value: &str) -> Result<(), String> {
    if value.len() > MAX_PROJECT_KEY_INPUT_LENGTH {
        return Err(format!(
            "Project key exceeds maximum length of {MAX_PROJECT_KEY_INPUT_LENGTH} characters"
        ));
    }
    if PROJECT_KEY_RE.is_match(&normalize_project_key(value)) {
        Ok(())
    } else {
        Err(format!(
            "'{value}' is not a valid project key (2-10 characters, starting with a letter)"
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
