//! Lenient delimited-text parsing for bulk CSV imports.
//!
//! This is deliberately not an RFC 4180 reader. Import sources are
//! spreadsheet exports of wildly varying quality, so the parser follows a
//! permissive contract instead:
//!
//! - A quoted field may contain commas; `""` inside quotes is a literal `"`.
//! - A quoted field cannot span physical lines.
//! - Every assembled field is trimmed (this also strips the `\r` of CRLF
//!   line endings).
//! - Malformed quoting degrades to best-effort splitting. Parsing never
//!   fails; bad data is caught later by row validation.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A parsed delimited-text document: one header row plus zero or more data
/// rows. Rows keep their input order; cell values are already trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// An empty table (blank input).
    pub fn empty() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Parse an entire delimited-text document.
///
/// Splits on `\n`, skips blank lines, and treats the first non-blank line
/// as the header row. Rows are not padded or truncated to the header width;
/// downstream mapping tolerates ragged rows.
pub fn parse_table(input: &str) -> RawTable {
    let mut lines = input.split('\n').filter(|line| !line.trim().is_empty());

    let headers = match lines.next() {
        Some(line) => split_line(line),
        None => return RawTable::empty(),
    };
    let rows = lines.map(split_line).collect();

    RawTable { headers, rows }
}

/// Split a single line into trimmed fields.
///
/// Char-by-char state machine with a quote toggle: a `"` flips the in-quotes
/// state, except that `""` while inside quotes emits one literal `"`. A `,`
/// ends the field only outside quotes. An unterminated quote simply runs to
/// the end of the line.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Render a header row plus data rows back into delimited text.
///
/// The inverse of [`parse_table`] for well-behaved values: a cell is quoted
/// only when it contains a comma or a quote, and embedded quotes are
/// doubled. Newlines inside a cell are replaced with spaces, since quoted
/// fields cannot span lines.
pub fn serialize_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut out = join_line(headers);
    for row in rows {
        out.push('\n');
        out.push_str(&join_line(row));
    }
    out
}

fn join_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| encode_cell(cell))
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_cell(cell: &str) -> String {
    let flat = if cell.contains('\n') || cell.contains('\r') {
        cell.replace(['\n', '\r'], " ")
    } else {
        cell.to_string()
    };
    if flat.contains(',') || flat.contains('"') {
        format!("\"{}\"", flat.replace('"', "\"\""))
    } else {
        flat
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
