//! Entity kinds and the static per-kind import rule sets.
//!
//! A rule set names the required fields, the optional fields, and the
//! semantic checks for one importable entity kind. Evaluation is two
//! independent passes over a mapped row: required-presence first, then every
//! check whose field was provided. A row collects *all* of its errors; no
//! check short-circuits another.

use serde::{Deserialize, Serialize};

use crate::fields;
use crate::mapping::MappedRow;
use crate::report::{RowErrorKind, ValidationError};

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

// Logical field names shared between rule sets, the importer, and clients.
pub const FIELD_TITLE: &str = "title";
pub const FIELD_PROJECT: &str = "project";
pub const FIELD_NAME: &str = "name";
pub const FIELD_KEY: &str = "key";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_PRIORITY: &str = "priority";
pub const FIELD_ESTIMATE: &str = "estimate";
pub const FIELD_DUE_DATE: &str = "due_date";
pub const FIELD_ASSIGNEE_EMAIL: &str = "assignee_email";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_DISPLAY_NAME: &str = "display_name";
pub const FIELD_ROLE: &str = "role";

// ---------------------------------------------------------------------------
// Entity Kind
// ---------------------------------------------------------------------------

/// An importable entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    WorkItem,
    Project,
    User,
}

impl EntityKind {
    /// Return the kind name as it appears in requests and job rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkItem => "work_item",
            Self::Project => "project",
            Self::User => "user",
        }
    }

    /// Parse a kind string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "work_item" => Some(Self::WorkItem),
            "project" => Some(Self::Project),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    /// All valid kind values.
    pub const ALL: &'static [&'static str] = &["work_item", "project", "user"];
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rule Sets
// ---------------------------------------------------------------------------

/// A semantic check attached to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Numeric,
    Date,
    Email,
    ProjectKey,
}

/// Pairing of a field with the check applied when the field is provided.
#[derive(Debug, Clone, Copy)]
pub struct FieldCheck {
    pub field: &'static str,
    pub check: CheckKind,
}

/// The import contract for one entity kind.
#[derive(Debug)]
pub struct RuleSet {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub checks: &'static [FieldCheck],
    /// Field whose normalized value must be unique across the store and the
    /// file being imported.
    pub unique_key: Option<&'static str>,
}

static WORK_ITEM_RULES: RuleSet = RuleSet {
    required: &[FIELD_TITLE, FIELD_PROJECT],
    optional: &[
        FIELD_DESCRIPTION,
        FIELD_TYPE,
        FIELD_STATUS,
        FIELD_PRIORITY,
        FIELD_ESTIMATE,
        FIELD_DUE_DATE,
        FIELD_ASSIGNEE_EMAIL,
    ],
    checks: &[
        FieldCheck {
            field: FIELD_ESTIMATE,
            check: CheckKind::Numeric,
        },
        FieldCheck {
            field: FIELD_DUE_DATE,
            check: CheckKind::Date,
        },
    ],
    unique_key: None,
};

static PROJECT_RULES: RuleSet = RuleSet {
    required: &[FIELD_NAME, FIELD_KEY],
    optional: &[FIELD_DESCRIPTION],
    checks: &[FieldCheck {
        field: FIELD_KEY,
        check: CheckKind::ProjectKey,
    }],
    unique_key: Some(FIELD_KEY),
};

static USER_RULES: RuleSet = RuleSet {
    required: &[FIELD_EMAIL],
    optional: &[FIELD_DISPLAY_NAME, FIELD_ROLE],
    checks: &[FieldCheck {
        field: FIELD_EMAIL,
        check: CheckKind::Email,
    }],
    unique_key: None,
};

/// The rule set for an entity kind.
pub fn rule_set(kind: EntityKind) -> &'static RuleSet {
    match kind {
        EntityKind::WorkItem => &WORK_ITEM_RULES,
        EntityKind::Project => &PROJECT_RULES,
        EntityKind::User => &USER_RULES,
    }
}

fn apply_check(check: CheckKind, value: &str) -> Result<(), String> {
    match check {
        CheckKind::Numeric => fields::check_numeric(value),
        CheckKind::Date => fields::check_date(value),
        CheckKind::Email => fields::check_email(value),
        CheckKind::ProjectKey => fields::check_project_key(value),
    }
}

// ---------------------------------------------------------------------------
// Row evaluation
// ---------------------------------------------------------------------------

/// Evaluate one mapped row against its kind's rule set.
///
/// Returns every error the row produced: one per missing required field,
/// one per failing semantic check. Checks skip absent fields (absence of an
/// optional field is not an error; absence of a required one already is).
pub fn validate_row(kind: EntityKind, row: &MappedRow) -> Vec<ValidationError> {
    let rules = rule_set(kind);
    let mut errors = Vec::new();

    for field in rules.required {
        if !row.is_provided(field) {
            errors.push(ValidationError::new(
                row.row,
                *field,
                RowErrorKind::Validation,
                format!("Required field '{field}' is missing"),
            ));
        }
    }

    for check in rules.checks {
        if let Some(value) = row.get(check.field) {
            if let Err(message) = apply_check(check.check, value) {
                errors.push(
                    ValidationError::new(row.row, check.field, RowErrorKind::Validation, message)
                        .with_value(value),
                );
            }
        }
    }

    errors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
