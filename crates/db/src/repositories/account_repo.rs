//! Repository for the `user_accounts` table.

use sqlx::PgPool;
use taskforge_core::types::DbId;
use taskforge_import::store::ProfileUpdate;

/// Provides the import-facing operations on user accounts.
pub struct AccountRepo;

impl AccountRepo {
    /// Find an account ID by email, matched case-insensitively.
    pub async fn find_id_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let query = "SELECT id FROM user_accounts WHERE LOWER(email) = LOWER($1)";
        sqlx::query_scalar::<_, DbId>(query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Update profile fields, keeping current values where the input is `None`.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &ProfileUpdate,
    ) -> Result<u64, sqlx::Error> {
        let query = "UPDATE user_accounts SET \
                display_name = COALESCE($2, display_name), \
                role = COALESCE($3, role), \
                updated_at = now() \
             WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .bind(&input.display_name)
            .bind(&input.role)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
