//! Field mapping: projecting raw CSV rows onto logical entity fields.
//!
//! The caller supplies a mapping from logical field names (e.g. `title`) to
//! source column headers (e.g. `Issue name`). Resolution is strictly
//! presence-based: a logical field is set only when the mapped column exists
//! in the header row *and* the cell holds a non-empty value. An empty or
//! whitespace-only cell leaves the field absent, which is a different thing
//! than an empty string — rule checks skip absent fields, and required-field
//! checks report them as missing.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::csv::RawTable;

/// Logical field name -> source column header.
pub type FieldMapping = HashMap<String, String>;

/// The header row occupies line 1 of the source document.
pub const HEADER_LINE: usize = 1;

/// User-facing row number for the data row at `index` (0-based).
///
/// Data rows start on line 2, right after the header, so every error can be
/// correlated with the source file without re-parsing it.
pub fn row_number(index: usize) -> usize {
    index + HEADER_LINE + 1
}

/// One data row projected onto logical fields.
///
/// `values` is ordered so that serialized previews and error payloads come
/// out byte-identical across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedRow {
    /// 1-based source line number (header = line 1).
    pub row: usize,
    pub values: BTreeMap<String, String>,
}

impl MappedRow {
    /// The value of a logical field, if the field was provided.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Whether a logical field was provided at all.
    pub fn is_provided(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// The row's field values as a compact JSON object, for error records
    /// that need to carry the offending row verbatim.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.values).unwrap_or_default()
    }
}

/// Project one raw row onto logical fields. `index` is the row's 0-based
/// position among the data rows.
pub fn resolve_row(
    headers: &[String],
    cells: &[String],
    mapping: &FieldMapping,
    index: usize,
) -> MappedRow {
    let mut values = BTreeMap::new();

    for (field, column) in mapping {
        let Some(pos) = headers.iter().position(|h| h == column) else {
            continue;
        };
        let Some(cell) = cells.get(pos) else {
            continue;
        };
        if cell.trim().is_empty() {
            continue;
        }
        values.insert(field.clone(), cell.clone());
    }

    MappedRow {
        row: row_number(index),
        values,
    }
}

/// Project every data row of a parsed table.
pub fn resolve_rows(table: &RawTable, mapping: &FieldMapping) -> Vec<MappedRow> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, cells)| resolve_row(&table.headers, cells, mapping, index))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
