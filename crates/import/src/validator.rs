//! The validation phase: parse, map, check every row, and report.
//!
//! Validation is a stateless request/response pass — nothing is persisted.
//! Row-level problems land in the report; only a store failure during the
//! duplicate pre-check aborts the call.

use std::collections::{HashMap, HashSet};

use taskforge_core::csv;
use taskforge_core::fields;
use taskforge_core::mapping::{self, FieldMapping, MappedRow};
use taskforge_core::report::{RowErrorKind, ValidationError, ValidationReport};
use taskforge_core::rules::{self, EntityKind};

use crate::store::{ProjectStore, StoreError};

/// Validate one upload against `kind`'s rule set.
///
/// Every row is judged independently and keeps all of its errors. For kinds
/// with a unique key, one bulk store query covers the whole file; rows that
/// collide with stored data or with each other are all flagged.
pub async fn validate<S>(
    store: &S,
    kind: EntityKind,
    raw_text: &str,
    field_mapping: &FieldMapping,
) -> Result<ValidationReport, StoreError>
where
    S: ProjectStore + ?Sized,
{
    let table = csv::parse_table(raw_text);
    let rows = mapping::resolve_rows(&table, field_mapping);
    let duplicates = find_duplicate_rows(store, kind, &rows).await?;

    let mut errors = Vec::new();
    for row in &rows {
        errors.extend(rules::validate_row(kind, row));
        if let Some(hit) = duplicates.get(&row.row) {
            errors.push(
                ValidationError::new(row.row, hit.field, RowErrorKind::Duplicate, &hit.message)
                    .with_value(&hit.original),
            );
        }
    }

    Ok(ValidationReport::from_parts(table.headers, &rows, errors))
}

struct DuplicateHit {
    field: &'static str,
    message: String,
    original: String,
}

/// Duplicate pre-check for kinds with a unique key field.
///
/// Gathers every normalized key in the file, asks the store about all of
/// them in one query, and flags each row whose key is taken — by the store
/// or by another row of the same file. Flagging is order-independent: when
/// two rows share a key, both are flagged, not just the second.
async fn find_duplicate_rows<S>(
    store: &S,
    kind: EntityKind,
    rows: &[MappedRow],
) -> Result<HashMap<usize, DuplicateHit>, StoreError>
where
    S: ProjectStore + ?Sized,
{
    let Some(key_field) = rules::rule_set(kind).unique_key else {
        return Ok(HashMap::new());
    };

    let mut keyed_rows: Vec<(usize, String, String)> = Vec::new();
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    for row in rows {
        if let Some(value) = row.get(key_field) {
            let normalized = fields::normalize_project_key(value);
            *occurrences.entry(normalized.clone()).or_insert(0) += 1;
            keyed_rows.push((row.row, normalized, value.to_string()));
        }
    }
    if keyed_rows.is_empty() {
        return Ok(HashMap::new());
    }

    let mut candidates: Vec<String> = occurrences.keys().cloned().collect();
    candidates.sort();
    let taken: HashSet<String> = store
        .find_existing_keys(&candidates)
        .await?
        .into_iter()
        .collect();

    let mut hits = HashMap::new();
    for (row, normalized, original) in keyed_rows {
        let in_store = taken.contains(&normalized);
        let in_file = occurrences.get(&normalized).copied().unwrap_or(0) > 1;
        if in_store || in_file {
            let message = if in_store {
                format!("A project with key '{normalized}' already exists")
            } else {
                format!("Key '{normalized}' appears more than once in this file")
            };
            hits.insert(
                row,
                DuplicateHit {
                    field: key_field,
                    message,
                    original,
                },
            );
        }
    }
    Ok(hits)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
