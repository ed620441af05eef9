//! Repository for the `work_items` table.

use sqlx::PgPool;
use taskforge_core::types::DbId;
use taskforge_import::store::NewWorkItem;

/// Provides the import-facing operations on work items.
pub struct WorkItemRepo;

impl WorkItemRepo {
    /// Insert a work item, returning the new ID.
    pub async fn insert(pool: &PgPool, input: &NewWorkItem) -> Result<DbId, sqlx::Error> {
        let query = "INSERT INTO work_items \
                (project_id, title, description, type_id, status_id, priority_id, \
                 estimate, due_date, assignee_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id";
        sqlx::query_scalar::<_, DbId>(query)
            .bind(input.project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.type_id)
            .bind(input.status_id)
            .bind(input.priority_id)
            .bind(input.estimate)
            .bind(input.due_date)
            .bind(input.assignee_id)
            .fetch_one(pool)
            .await
    }
}
