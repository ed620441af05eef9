//! Rows from the `projects` table.

use sqlx::FromRow;
use taskforge_core::types::DbId;
use taskforge_import::store::ProjectRef;

/// The subset of a project row that reference resolution needs.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: DbId,
    pub name: String,
    pub key: String,
}

impl From<ProjectRow> for ProjectRef {
    fn from(row: ProjectRow) -> Self {
        ProjectRef {
            id: row.id,
            name: row.name,
            key: row.key,
        }
    }
}
