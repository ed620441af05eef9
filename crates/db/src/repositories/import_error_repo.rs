//! Repository for the `import_errors` table.

use sqlx::PgPool;
use taskforge_core::types::DbId;
use taskforge_import::store::CreateImportError;

use crate::models::import::ImportErrorRow;

/// Column list for import error queries.
const COLUMNS: &str =
    "id, job_id, row_number, field_name, error_type, message, original_value, created_at";

/// Append-only storage for per-row import failures.
pub struct ImportErrorRepo;

impl ImportErrorRepo {
    /// Insert one error record, returning the new ID.
    pub async fn insert(pool: &PgPool, input: &CreateImportError) -> Result<DbId, sqlx::Error> {
        let query = "INSERT INTO import_errors \
                (job_id, row_number, field_name, error_type, message, original_value) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id";
        sqlx::query_scalar::<_, DbId>(query)
            .bind(input.job_id)
            .bind(input.row_number)
            .bind(&input.field_name)
            .bind(input.kind.as_str())
            .bind(&input.message)
            .bind(&input.original_value)
            .fetch_one(pool)
            .await
    }

    /// List errors for a job ordered by row number, capped at `limit`.
    pub async fn list_by_job(
        pool: &PgPool,
        job_id: DbId,
        limit: i64,
    ) -> Result<Vec<ImportErrorRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM import_errors
             WHERE job_id = $1
             ORDER BY row_number, id
             LIMIT $2"
        );
        sqlx::query_as::<_, ImportErrorRow>(&query)
            .bind(job_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
