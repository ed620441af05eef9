//! [`PgStore`] adapts the repository layer to the `taskforge-import` store
//! traits, including the mapping from sqlx errors onto [`StoreError`].

use async_trait::async_trait;
use taskforge_core::types::DbId;
use taskforge_import::store::{
    AccountStore, CreateImportError, CreateImportJob, ImportErrorRecord, ImportJob, JobStore,
    NamedRef, NewProject, NewWorkItem, ProfileUpdate, ProjectRef, ProjectStore, ReferenceReader,
    RowCounts, StoreError, WorkItemStore,
};

use crate::models::import::{ImportErrorRow, ImportJobRow};
use crate::repositories::{
    AccountRepo, ImportErrorRepo, ImportJobRepo, ProjectRepo, ReferenceRepo, WorkItemRepo,
};
use crate::DbPool;

/// PostgreSQL-backed implementation of the import store traits.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    /// Wrap a connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Classify a sqlx error into the store error contract.
///
/// Unique violations on `uq_`-prefixed constraints become
/// [`StoreError::Rejected`] carrying the database message; everything else is
/// [`StoreError::Unavailable`].
fn map_store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        // PostgreSQL unique constraint violation: error code 23505
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint.starts_with("uq_") {
                return StoreError::Rejected(db_err.message().to_string());
            }
        }
    }
    tracing::error!(error = %err, "Database error");
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl ReferenceReader for PgStore {
    async fn list_statuses(&self) -> Result<Vec<NamedRef>, StoreError> {
        let rows = ReferenceRepo::list_statuses(&self.pool)
            .await
            .map_err(map_store_error)?;
        Ok(rows.into_iter().map(NamedRef::from).collect())
    }

    async fn list_priorities(&self) -> Result<Vec<NamedRef>, StoreError> {
        let rows = ReferenceRepo::list_priorities(&self.pool)
            .await
            .map_err(map_store_error)?;
        Ok(rows.into_iter().map(NamedRef::from).collect())
    }

    async fn list_item_types(&self) -> Result<Vec<NamedRef>, StoreError> {
        let rows = ReferenceRepo::list_item_types(&self.pool)
            .await
            .map_err(map_store_error)?;
        Ok(rows.into_iter().map(NamedRef::from).collect())
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRef>, StoreError> {
        let rows = ProjectRepo::list_refs(&self.pool)
            .await
            .map_err(map_store_error)?;
        Ok(rows.into_iter().map(ProjectRef::from).collect())
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn find_existing_keys(&self, keys: &[String]) -> Result<Vec<String>, StoreError> {
        ProjectRepo::find_existing_keys(&self.pool, keys)
            .await
            .map_err(map_store_error)
    }

    async fn insert_project(&self, project: NewProject) -> Result<DbId, StoreError> {
        ProjectRepo::insert(&self.pool, &project)
            .await
            .map_err(map_store_error)
    }
}

#[async_trait]
impl WorkItemStore for PgStore {
    async fn insert_work_item(&self, item: NewWorkItem) -> Result<DbId, StoreError> {
        WorkItemRepo::insert(&self.pool, &item)
            .await
            .map_err(map_store_error)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<DbId>, StoreError> {
        AccountRepo::find_id_by_email(&self.pool, email)
            .await
            .map_err(map_store_error)
    }

    async fn update_account_profile(
        &self,
        id: DbId,
        update: ProfileUpdate,
    ) -> Result<(), StoreError> {
        AccountRepo::update_profile(&self.pool, id, &update)
            .await
            .map_err(map_store_error)?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn create_job(&self, job: CreateImportJob) -> Result<ImportJob, StoreError> {
        let row = ImportJobRepo::create(&self.pool, &job)
            .await
            .map_err(map_store_error)?;
        Ok(row.into_domain())
    }

    async fn find_job(&self, id: DbId) -> Result<Option<ImportJob>, StoreError> {
        let row = ImportJobRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_store_error)?;
        Ok(row.map(ImportJobRow::into_domain))
    }

    async fn begin_import(&self, id: DbId) -> Result<Option<ImportJob>, StoreError> {
        let row = ImportJobRepo::begin_import(&self.pool, id)
            .await
            .map_err(map_store_error)?;
        Ok(row.map(ImportJobRow::into_domain))
    }

    async fn checkpoint_progress(&self, id: DbId, counts: RowCounts) -> Result<(), StoreError> {
        ImportJobRepo::update_progress(
            &self.pool,
            id,
            counts.processed as i32,
            counts.succeeded as i32,
            counts.failed as i32,
        )
        .await
        .map_err(map_store_error)?;
        Ok(())
    }

    async fn complete_job(&self, id: DbId, counts: RowCounts) -> Result<(), StoreError> {
        ImportJobRepo::complete(
            &self.pool,
            id,
            counts.processed as i32,
            counts.succeeded as i32,
            counts.failed as i32,
        )
        .await
        .map_err(map_store_error)?;
        Ok(())
    }

    async fn fail_job(&self, id: DbId, message: &str) -> Result<(), StoreError> {
        ImportJobRepo::fail(&self.pool, id, message)
            .await
            .map_err(map_store_error)?;
        Ok(())
    }

    async fn append_error(&self, error: CreateImportError) -> Result<(), StoreError> {
        ImportErrorRepo::insert(&self.pool, &error)
            .await
            .map_err(map_store_error)?;
        Ok(())
    }

    async fn list_errors(
        &self,
        job_id: DbId,
        limit: i64,
    ) -> Result<Vec<ImportErrorRecord>, StoreError> {
        let rows = ImportErrorRepo::list_by_job(&self.pool, job_id, limit)
            .await
            .map_err(map_store_error)?;
        Ok(rows.into_iter().map(ImportErrorRow::into_domain).collect())
    }

    async fn list_recent_jobs(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ImportJob>, StoreError> {
        let rows = ImportJobRepo::list_recent(&self.pool, limit, offset)
            .await
            .map_err(map_store_error)?;
        Ok(rows.into_iter().map(ImportJobRow::into_domain).collect())
    }
}
