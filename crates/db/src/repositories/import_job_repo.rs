//! Repository for the `import_jobs` table.

use sqlx::PgPool;
use taskforge_core::types::DbId;
use taskforge_import::store::CreateImportJob;

use crate::models::import::ImportJobRow;

/// Column list for import job queries.
const COLUMNS: &str = "id, entity_type, field_mapping, source_text, status, \
    processed_rows, successful_rows, failed_rows, error_message, \
    started_at, completed_at, created_at, updated_at";

/// Provides CRUD operations for import jobs.
pub struct ImportJobRepo;

impl ImportJobRepo {
    /// Create a job in 'pending' status, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateImportJob,
    ) -> Result<ImportJobRow, sqlx::Error> {
        let field_mapping =
            serde_json::to_value(&input.field_mapping).unwrap_or_else(|_| serde_json::json!({}));
        let query = format!(
            "INSERT INTO import_jobs (entity_type, field_mapping, source_text)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImportJobRow>(&query)
            .bind(&input.entity_type)
            .bind(&field_mapping)
            .bind(&input.source_text)
            .fetch_one(pool)
            .await
    }

    /// Find an import job by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ImportJobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM import_jobs WHERE id = $1");
        sqlx::query_as::<_, ImportJobRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically move a pending job into 'importing', stamping `started_at`.
    ///
    /// The status guard in the WHERE clause means at most one caller gets the
    /// row back; a job that is missing or has left 'pending' yields `None`.
    pub async fn begin_import(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ImportJobRow>, sqlx::Error> {
        let query = format!(
            "UPDATE import_jobs SET
                status = 'importing',
                started_at = now(),
                updated_at = now()
             WHERE id = $1 AND status = 'pending'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImportJobRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Persist progress counters mid-run.
    pub async fn update_progress(
        pool: &PgPool,
        id: DbId,
        processed: i32,
        succeeded: i32,
        failed: i32,
    ) -> Result<Option<ImportJobRow>, sqlx::Error> {
        let query = format!(
            "UPDATE import_jobs SET
                processed_rows = $2,
                successful_rows = $3,
                failed_rows = $4,
                updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImportJobRow>(&query)
            .bind(id)
            .bind(processed)
            .bind(succeeded)
            .bind(failed)
            .fetch_optional(pool)
            .await
    }

    /// Mark a job completed with its final counters.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        processed: i32,
        succeeded: i32,
        failed: i32,
    ) -> Result<Option<ImportJobRow>, sqlx::Error> {
        let query = format!(
            "UPDATE import_jobs SET
                status = 'completed',
                processed_rows = $2,
                successful_rows = $3,
                failed_rows = $4,
                completed_at = now(),
                updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImportJobRow>(&query)
            .bind(id)
            .bind(processed)
            .bind(succeeded)
            .bind(failed)
            .fetch_optional(pool)
            .await
    }

    /// Mark a job failed with an operator-facing message.
    pub async fn fail(
        pool: &PgPool,
        id: DbId,
        message: &str,
    ) -> Result<Option<ImportJobRow>, sqlx::Error> {
        let query = format!(
            "UPDATE import_jobs SET
                status = 'failed',
                error_message = $2,
                completed_at = now(),
                updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImportJobRow>(&query)
            .bind(id)
            .bind(message)
            .fetch_optional(pool)
            .await
    }

    /// List import jobs, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ImportJobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM import_jobs
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ImportJobRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
