//! In-memory store for tests and local development.
//!
//! Behaves like the PostgreSQL adapter where the pipeline can tell the
//! difference: project keys are unique (violations come back as
//! `StoreError::Rejected` with the constraint name), account lookups are
//! case-insensitive, and job claims are atomic under the lock. Every method
//! can be switched to fail via [`MemoryStore::set_unavailable`] to exercise
//! outage paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use taskforge_core::job::ImportJobStatus;
use taskforge_core::types::DbId;

use crate::store::{
    AccountStore, CreateImportError, CreateImportJob, ImportErrorRecord, ImportJob, JobStore,
    NamedRef, NewProject, NewWorkItem, ProfileUpdate, ProjectRef, ProjectStore, ReferenceReader,
    RowCounts, StoreError, WorkItemStore,
};

#[derive(Debug, Clone)]
struct StoredProject {
    id: DbId,
    name: String,
    key: String,
}

#[derive(Debug, Clone)]
struct StoredAccount {
    id: DbId,
    email: String,
    display_name: Option<String>,
    role: Option<String>,
}

#[derive(Default)]
struct Inner {
    statuses: Vec<NamedRef>,
    priorities: Vec<NamedRef>,
    item_types: Vec<NamedRef>,
    projects: Vec<StoredProject>,
    accounts: Vec<StoredAccount>,
    work_items: Vec<NewWorkItem>,
    jobs: Vec<ImportJob>,
    errors: Vec<ImportErrorRecord>,
    checkpoints: Vec<RowCounts>,
    key_queries: usize,
    account_lookups: usize,
    next_id: DbId,
}

impl Inner {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn job_mut(&mut self, id: DbId) -> Option<&mut ImportJob> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// An empty store: no reference data, no projects, no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the stock reference tables.
    pub fn with_default_reference_data() -> Self {
        let store = Self::new();
        store.seed_statuses(&["To Do", "In Progress", "Done"]);
        store.seed_priorities(&["Low", "Medium", "High"]);
        store.seed_item_types(&["Task", "Bug", "Story"]);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store switched off".into()))
        } else {
            Ok(())
        }
    }

    /// Make every operation fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    // -- seeding --------------------------------------------------------------

    pub fn seed_statuses(&self, names: &[&str]) {
        let mut inner = self.lock();
        for name in names {
            let id = inner.next_id();
            inner.statuses.push(NamedRef {
                id,
                name: name.to_string(),
            });
        }
    }

    pub fn seed_priorities(&self, names: &[&str]) {
        let mut inner = self.lock();
        for name in names {
            let id = inner.next_id();
            inner.priorities.push(NamedRef {
                id,
                name: name.to_string(),
            });
        }
    }

    pub fn seed_item_types(&self, names: &[&str]) {
        let mut inner = self.lock();
        for name in names {
            let id = inner.next_id();
            inner.item_types.push(NamedRef {
                id,
                name: name.to_string(),
            });
        }
    }

    pub fn seed_project(&self, name: &str, key: &str) -> DbId {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.projects.push(StoredProject {
            id,
            name: name.to_string(),
            key: key.to_string(),
        });
        id
    }

    pub fn seed_account(&self, email: &str) -> DbId {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.accounts.push(StoredAccount {
            id,
            email: email.to_string(),
            display_name: None,
            role: None,
        });
        id
    }

    // -- test observation -----------------------------------------------------

    /// Stored project keys, in insertion order.
    pub fn project_keys(&self) -> Vec<String> {
        self.lock().projects.iter().map(|p| p.key.clone()).collect()
    }

    /// Snapshot of inserted work items, in insertion order.
    pub fn work_items(&self) -> Vec<NewWorkItem> {
        self.lock().work_items.clone()
    }

    pub fn status_id(&self, name: &str) -> Option<DbId> {
        self.lock()
            .statuses
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.id)
    }

    pub fn priority_id(&self, name: &str) -> Option<DbId> {
        self.lock()
            .priorities
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id)
    }

    pub fn default_item_type_id(&self) -> Option<DbId> {
        self.lock().item_types.first().map(|t| t.id)
    }

    /// `(display_name, role)` of an account.
    pub fn account_profile(&self, id: DbId) -> Option<(Option<String>, Option<String>)> {
        self.lock()
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| (a.display_name.clone(), a.role.clone()))
    }

    /// Progress counter snapshots, one per checkpoint call.
    pub fn checkpoint_log(&self) -> Vec<RowCounts> {
        self.lock().checkpoints.clone()
    }

    /// Number of `find_existing_keys` calls so far.
    pub fn key_query_count(&self) -> usize {
        self.lock().key_queries
    }

    /// Number of `find_account_by_email` calls so far.
    pub fn account_lookup_count(&self) -> usize {
        self.lock().account_lookups
    }
}

#[async_trait]
impl ReferenceReader for MemoryStore {
    async fn list_statuses(&self) -> Result<Vec<NamedRef>, StoreError> {
        self.check_available()?;
        Ok(self.lock().statuses.clone())
    }

    async fn list_priorities(&self) -> Result<Vec<NamedRef>, StoreError> {
        self.check_available()?;
        Ok(self.lock().priorities.clone())
    }

    async fn list_item_types(&self) -> Result<Vec<NamedRef>, StoreError> {
        self.check_available()?;
        Ok(self.lock().item_types.clone())
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRef>, StoreError> {
        self.check_available()?;
        Ok(self
            .lock()
            .projects
            .iter()
            .map(|p| ProjectRef {
                id: p.id,
                name: p.name.clone(),
                key: p.key.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn find_existing_keys(&self, keys: &[String]) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        inner.key_queries += 1;
        Ok(inner
            .projects
            .iter()
            .filter(|p| keys.iter().any(|k| k.eq_ignore_ascii_case(&p.key)))
            .map(|p| p.key.to_uppercase())
            .collect())
    }

    async fn insert_project(&self, project: NewProject) -> Result<DbId, StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        if inner
            .projects
            .iter()
            .any(|p| p.key.eq_ignore_ascii_case(&project.key))
        {
            return Err(StoreError::Rejected(
                "duplicate key value violates unique constraint \"uq_projects_key\"".into(),
            ));
        }
        let id = inner.next_id();
        inner.projects.push(StoredProject {
            id,
            name: project.name,
            key: project.key,
        });
        Ok(id)
    }
}

#[async_trait]
impl WorkItemStore for MemoryStore {
    async fn insert_work_item(&self, item: NewWorkItem) -> Result<DbId, StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.work_items.push(item);
        Ok(id)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<DbId>, StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        inner.account_lookups += 1;
        Ok(inner
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .map(|a| a.id))
    }

    async fn update_account_profile(
        &self,
        id: DbId,
        update: ProfileUpdate,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        let Some(account) = inner.accounts.iter_mut().find(|a| a.id == id) else {
            return Err(StoreError::Rejected(format!("no account with id {id}")));
        };
        if let Some(display_name) = update.display_name {
            account.display_name = Some(display_name);
        }
        if let Some(role) = update.role {
            account.role = Some(role);
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, job: CreateImportJob) -> Result<ImportJob, StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        let id = inner.next_id();
        let now = Utc::now();
        let job = ImportJob {
            id,
            entity_type: job.entity_type,
            field_mapping: job.field_mapping,
            source_text: job.source_text,
            status: ImportJobStatus::Pending,
            processed_rows: 0,
            successful_rows: 0,
            failed_rows: 0,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: DbId) -> Result<Option<ImportJob>, StoreError> {
        self.check_available()?;
        Ok(self.lock().jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn begin_import(&self, id: DbId) -> Result<Option<ImportJob>, StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        let Some(job) = inner.job_mut(id) else {
            return Ok(None);
        };
        if job.status != ImportJobStatus::Pending {
            return Ok(None);
        }
        let now = Utc::now();
        job.status = ImportJobStatus::Importing;
        job.started_at = Some(now);
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn checkpoint_progress(&self, id: DbId, counts: RowCounts) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        inner.checkpoints.push(counts);
        if let Some(job) = inner.job_mut(id) {
            job.processed_rows = counts.processed as i32;
            job.successful_rows = counts.succeeded as i32;
            job.failed_rows = counts.failed as i32;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn complete_job(&self, id: DbId, counts: RowCounts) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        if let Some(job) = inner.job_mut(id) {
            let now = Utc::now();
            job.status = ImportJobStatus::Completed;
            job.processed_rows = counts.processed as i32;
            job.successful_rows = counts.succeeded as i32;
            job.failed_rows = counts.failed as i32;
            job.completed_at = Some(now);
            job.updated_at = now;
        }
        Ok(())
    }

    async fn fail_job(&self, id: DbId, message: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        if let Some(job) = inner.job_mut(id) {
            let now = Utc::now();
            job.status = ImportJobStatus::Failed;
            job.error_message = Some(message.to_string());
            job.completed_at = Some(now);
            job.updated_at = now;
        }
        Ok(())
    }

    async fn append_error(&self, error: CreateImportError) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.errors.push(ImportErrorRecord {
            id,
            job_id: error.job_id,
            row_number: error.row_number,
            field_name: error.field_name,
            kind: error.kind,
            message: error.message,
            original_value: error.original_value,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_errors(
        &self,
        job_id: DbId,
        limit: i64,
    ) -> Result<Vec<ImportErrorRecord>, StoreError> {
        self.check_available()?;
        let mut errors: Vec<ImportErrorRecord> = self
            .lock()
            .errors
            .iter()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect();
        errors.sort_by_key(|e| (e.row_number, e.id));
        errors.truncate(limit.max(0) as usize);
        Ok(errors)
    }

    async fn list_recent_jobs(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ImportJob>, StoreError> {
        self.check_available()?;
        let mut jobs = self.lock().jobs.clone();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(jobs
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
