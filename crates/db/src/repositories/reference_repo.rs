//! Repository for the work item reference tables.

use sqlx::PgPool;

use crate::models::reference::NamedRow;

/// Column list shared by the reference tables.
const COLUMNS: &str = "id, name";

/// Read access to statuses, priorities, and item types.
///
/// Rows come back in `id` order, so the first row of each table is the one
/// seeded first and stays the deterministic coercion default.
pub struct ReferenceRepo;

impl ReferenceRepo {
    /// List all work item statuses.
    pub async fn list_statuses(pool: &PgPool) -> Result<Vec<NamedRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_item_statuses ORDER BY id");
        sqlx::query_as::<_, NamedRow>(&query).fetch_all(pool).await
    }

    /// List all work item priorities.
    pub async fn list_priorities(pool: &PgPool) -> Result<Vec<NamedRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_item_priorities ORDER BY id");
        sqlx::query_as::<_, NamedRow>(&query).fetch_all(pool).await
    }

    /// List all work item types.
    pub async fn list_item_types(pool: &PgPool) -> Result<Vec<NamedRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_item_types ORDER BY id");
        sqlx::query_as::<_, NamedRow>(&query).fetch_all(pool).await
    }
}
