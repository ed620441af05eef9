//! Row error and validation report types shared by the validate and import
//! phases.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::mapping::MappedRow;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Hard cap on errors carried in a report or returned per status fetch.
/// Counts always cover the full input; only the error list is truncated.
pub const MAX_REPORT_ERRORS: usize = 100;

/// Number of mapped rows echoed back as a preview, valid or not.
pub const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Row Error Kind
// ---------------------------------------------------------------------------

/// Classification of a row-level import error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorKind {
    /// A rule-set check failed (missing required field, bad value shape).
    Validation,
    /// The row's unique key collides with stored data or another row.
    Duplicate,
    /// A required relationship could not be resolved.
    Reference,
    /// The store rejected the write or failed while performing it.
    System,
}

impl RowErrorKind {
    /// Return the kind name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Duplicate => "duplicate",
            Self::Reference => "reference",
            Self::System => "system",
        }
    }

    /// Parse a kind string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "validation" => Some(Self::Validation),
            "duplicate" => Some(Self::Duplicate),
            "reference" => Some(Self::Reference),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// All valid kind values.
    pub const ALL: &'static [&'static str] = &["validation", "duplicate", "reference", "system"];
}

impl std::fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validation Error
// ---------------------------------------------------------------------------

/// One row-level error. `row` is the 1-based source line number (header =
/// line 1), so users can jump straight to the offending line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,
    pub field: String,
    #[serde(rename = "error_type")]
    pub kind: RowErrorKind,
    pub message: String,
    /// The offending value when one exists (absent for missing fields).
    pub original_value: Option<String>,
}

impl ValidationError {
    pub fn new(
        row: usize,
        field: impl Into<String>,
        kind: RowErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            field: field.into(),
            kind,
            message: message.into(),
            original_value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.original_value = Some(value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Validation Report
// ---------------------------------------------------------------------------

/// The result of validating one CSV upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True iff *no* row produced an error, judged before truncation.
    pub is_valid: bool,
    /// Number of data rows in the input, valid or not.
    pub total_rows: usize,
    /// Number of data rows with zero errors.
    pub valid_rows: usize,
    /// At most [`MAX_REPORT_ERRORS`] errors, in row order.
    pub errors: Vec<ValidationError>,
    /// The first [`PREVIEW_ROWS`] mapped rows, regardless of validity.
    #[serde(skip_deserializing)]
    pub preview: Vec<MappedRow>,
    /// Headers as parsed from the source, for column mapping UIs.
    pub headers: Vec<String>,
}

impl ValidationReport {
    /// Assemble a report from the full (untruncated) error list.
    ///
    /// Validity and the row counts are computed over everything; only then
    /// is the error list capped.
    pub fn from_parts(
        headers: Vec<String>,
        mapped_rows: &[MappedRow],
        mut errors: Vec<ValidationError>,
    ) -> Self {
        let total_rows = mapped_rows.len();
        let failing_rows: HashSet<usize> = errors.iter().map(|e| e.row).collect();
        let valid_rows = mapped_rows
            .iter()
            .filter(|r| !failing_rows.contains(&r.row))
            .count();
        let is_valid = errors.is_empty();

        let preview = mapped_rows.iter().take(PREVIEW_ROWS).cloned().collect();
        errors.truncate(MAX_REPORT_ERRORS);

        Self {
            is_valid,
            total_rows,
            valid_rows,
            errors,
            preview,
            headers,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
