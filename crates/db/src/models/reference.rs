//! Rows from the work item reference tables (statuses, priorities, types).

use sqlx::FromRow;
use taskforge_core::types::DbId;
use taskforge_import::store::NamedRef;

/// A row from one of the `(id, name)` lookup tables.
#[derive(Debug, Clone, FromRow)]
pub struct NamedRow {
    pub id: DbId,
    pub name: String,
}

impl From<NamedRow> for NamedRef {
    fn from(row: NamedRow) -> Self {
        NamedRef {
            id: row.id,
            name: row.name,
        }
    }
}
