//! Storage interfaces the import pipeline runs against.
//!
//! Narrow, per-entity traits instead of one schemaless client: the pipeline
//! names exactly the reads and writes it performs. `taskforge-db` implements
//! them over PostgreSQL; [`crate::memory::MemoryStore`] implements them in
//! memory. The [`ImportStore`] supertrait bundles them for call sites that
//! hold a single store object.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use taskforge_core::job::ImportJobStatus;
use taskforge_core::mapping::FieldMapping;
use taskforge_core::report::RowErrorKind;
use taskforge_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// How a store operation failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store refused the write (unique violation, FK violation, ...).
    /// Row-level: the importer records it and moves on.
    #[error("{0}")]
    Rejected(String),

    /// The store could not be reached or the query itself failed.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// A named lookup row (work item status, priority, or type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRef {
    pub id: DbId,
    pub name: String,
}

/// A project as seen by reference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: DbId,
    pub name: String,
    pub key: String,
}

// ---------------------------------------------------------------------------
// Write payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    /// Already normalized (trimmed, uppercased).
    pub key: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkItem {
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub type_id: Option<DbId>,
    pub status_id: Option<DbId>,
    pub priority_id: Option<DbId>,
    pub estimate: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<DbId>,
}

/// Profile fields an import may overwrite on an existing account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub role: Option<String>,
}

// ---------------------------------------------------------------------------
// Job rows
// ---------------------------------------------------------------------------

/// A persisted import job. The uploaded text and field mapping travel with
/// the job so the detached import task needs nothing else.
#[derive(Debug, Clone, Serialize)]
pub struct ImportJob {
    pub id: DbId,
    pub entity_type: String,
    pub field_mapping: FieldMapping,
    /// Not echoed in responses; uploads can run to megabytes.
    #[serde(skip_serializing)]
    pub source_text: String,
    pub status: ImportJobStatus,
    pub processed_rows: i32,
    pub successful_rows: i32,
    pub failed_rows: i32,
    pub error_message: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateImportJob {
    pub entity_type: String,
    pub field_mapping: FieldMapping,
    pub source_text: String,
}

/// One persisted row-level error.
#[derive(Debug, Clone, Serialize)]
pub struct ImportErrorRecord {
    pub id: DbId,
    pub job_id: DbId,
    /// 1-based source line number (header = line 1).
    pub row_number: i32,
    pub field_name: String,
    #[serde(rename = "error_type")]
    pub kind: RowErrorKind,
    pub message: String,
    pub original_value: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateImportError {
    pub job_id: DbId,
    pub row_number: i32,
    pub field_name: String,
    pub kind: RowErrorKind,
    pub message: String,
    pub original_value: Option<String>,
}

/// Cumulative progress counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Bulk reads of the reference tables the lookup cache is built from.
#[async_trait]
pub trait ReferenceReader: Send + Sync {
    async fn list_statuses(&self) -> Result<Vec<NamedRef>, StoreError>;
    async fn list_priorities(&self) -> Result<Vec<NamedRef>, StoreError>;
    async fn list_item_types(&self) -> Result<Vec<NamedRef>, StoreError>;
    async fn list_projects(&self) -> Result<Vec<ProjectRef>, StoreError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Which of `keys` (already normalized) are taken. One query per batch,
    /// however many rows the upload has.
    async fn find_existing_keys(&self, keys: &[String]) -> Result<Vec<String>, StoreError>;

    async fn insert_project(&self, project: NewProject) -> Result<DbId, StoreError>;
}

#[async_trait]
pub trait WorkItemStore: Send + Sync {
    async fn insert_work_item(&self, item: NewWorkItem) -> Result<DbId, StoreError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Case-insensitive account lookup.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<DbId>, StoreError>;

    async fn update_account_profile(
        &self,
        id: DbId,
        update: ProfileUpdate,
    ) -> Result<(), StoreError>;
}

/// Lifecycle of import jobs and their error log. While a job runs, the
/// importer is the only writer of its row.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: CreateImportJob) -> Result<ImportJob, StoreError>;

    async fn find_job(&self, id: DbId) -> Result<Option<ImportJob>, StoreError>;

    /// Atomically claim a pending job for import, stamping `started_at`.
    /// Returns `None` when the job is missing or no longer pending, which is
    /// what makes double-starts harmless.
    async fn begin_import(&self, id: DbId) -> Result<Option<ImportJob>, StoreError>;

    async fn checkpoint_progress(&self, id: DbId, counts: RowCounts) -> Result<(), StoreError>;

    async fn complete_job(&self, id: DbId, counts: RowCounts) -> Result<(), StoreError>;

    async fn fail_job(&self, id: DbId, message: &str) -> Result<(), StoreError>;

    async fn append_error(&self, error: CreateImportError) -> Result<(), StoreError>;

    /// Errors for a job ordered by row number.
    async fn list_errors(
        &self,
        job_id: DbId,
        limit: i64,
    ) -> Result<Vec<ImportErrorRecord>, StoreError>;

    /// Most recently created jobs first.
    async fn list_recent_jobs(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ImportJob>, StoreError>;
}

/// Everything the pipeline needs, as one object-safe bundle.
pub trait ImportStore:
    ReferenceReader + ProjectStore + WorkItemStore + AccountStore + JobStore
{
}

impl<T> ImportStore for T where
    T: ReferenceReader + ProjectStore + WorkItemStore + AccountStore + JobStore
{
}
