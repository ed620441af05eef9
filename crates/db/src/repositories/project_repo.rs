//! Repository for the `projects` table.

use sqlx::PgPool;
use taskforge_core::types::DbId;
use taskforge_import::store::NewProject;

use crate::models::project::ProjectRow;

/// Column list for project reference queries.
const COLUMNS: &str = "id, name, key";

/// Provides the import-facing operations on projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// List id, name, and key for every project.
    pub async fn list_refs(pool: &PgPool) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY id");
        sqlx::query_as::<_, ProjectRow>(&query).fetch_all(pool).await
    }

    /// Return the subset of `keys` already taken, matched case-insensitively.
    /// Returned keys are uppercased.
    pub async fn find_existing_keys(
        pool: &PgPool,
        keys: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let query = "SELECT UPPER(key) FROM projects WHERE UPPER(key) = ANY($1)";
        sqlx::query_scalar::<_, String>(query)
            .bind(keys)
            .fetch_all(pool)
            .await
    }

    /// Insert a project, returning the new ID.
    pub async fn insert(pool: &PgPool, input: &NewProject) -> Result<DbId, sqlx::Error> {
        let query = "INSERT INTO projects (name, key, description) \
             VALUES ($1, $2, $3) \
             RETURNING id";
        sqlx::query_scalar::<_, DbId>(query)
            .bind(&input.name)
            .bind(&input.key)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }
}
