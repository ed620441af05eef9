//! The import executor: strictly sequential row writes with per-row error
//! capture.
//!
//! A run belongs to exactly one claimed job. Rows are written one at a time,
//! in file order; a bad row is recorded and skipped, never fatal. Only
//! non-row failures (unknown entity type, lookup-cache build failure, a
//! job-tracker write failing) abort the run and flip the job to `failed`.
//! Reaching the end of the input always means `completed`, whatever the
//! failure count says.

use std::sync::Arc;
use std::time::Duration;

use taskforge_core::cache::TtlCache;
use taskforge_core::csv;
use taskforge_core::fields;
use taskforge_core::job::CHECKPOINT_INTERVAL;
use taskforge_core::mapping::{self, MappedRow};
use taskforge_core::report::RowErrorKind;
use taskforge_core::rules::{self, EntityKind};
use taskforge_core::types::DbId;

use crate::lookup::LookupCache;
use crate::store::{
    AccountStore, CreateImportError, ImportJob, ImportStore, NewProject, NewWorkItem,
    ProfileUpdate, ProjectStore, RowCounts, StoreError, WorkItemStore,
};

/// Capacity of the per-run assignee lookup memo.
const ASSIGNEE_CACHE_CAPACITY: usize = 1024;

/// Lifetime of memoized assignee lookups within a run.
const ASSIGNEE_CACHE_TTL: Duration = Duration::from_secs(300);

/// Field name under which whole-row (system) failures are recorded.
const ROW_FIELD: &str = "row";

/// A run-fatal failure. Row-level problems never produce one of these.
#[derive(Debug, thiserror::Error)]
pub enum ImportRunError {
    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why one row was skipped.
#[derive(Debug)]
struct RowFailure {
    field: String,
    kind: RowErrorKind,
    message: String,
    original_value: Option<String>,
}

type AssigneeMemo = TtlCache<String, Option<DbId>>;

/// Spawn a claimed job's run as a detached task.
///
/// Fire-and-forget: the handle is dropped and progress is observable only
/// through the job row. A crash mid-run leaves the job stuck in `importing`.
pub fn spawn_import(store: Arc<dyn ImportStore>, job: ImportJob) {
    tokio::spawn(async move {
        run_to_completion(store.as_ref(), job).await;
    });
}

/// Drive a claimed job to a terminal status. Never returns an error — the
/// outcome lands on the job row either way.
pub async fn run_to_completion<S>(store: &S, job: ImportJob)
where
    S: ImportStore + ?Sized,
{
    let job_id = job.id;
    match execute(store, &job).await {
        Ok(counts) => {
            if let Err(e) = store.complete_job(job_id, counts).await {
                tracing::error!(job_id, error = %e, "Import finished but completion could not be recorded");
                return;
            }
            tracing::info!(
                job_id,
                processed = counts.processed,
                succeeded = counts.succeeded,
                failed = counts.failed,
                "Import completed"
            );
        }
        Err(e) => {
            tracing::error!(job_id, error = %e, "Import failed");
            if let Err(mark) = store.fail_job(job_id, &e.to_string()).await {
                tracing::error!(job_id, error = %mark, "Import failure could not be recorded");
            }
        }
    }
}

async fn execute<S>(store: &S, job: &ImportJob) -> Result<RowCounts, ImportRunError>
where
    S: ImportStore + ?Sized,
{
    let Some(kind) = EntityKind::from_str(&job.entity_type) else {
        return Err(ImportRunError::UnknownEntityType(job.entity_type.clone()));
    };

    let table = csv::parse_table(&job.source_text);
    let rows = mapping::resolve_rows(&table, &job.field_mapping);
    let lookups = LookupCache::build(store).await?;
    let mut assignees: AssigneeMemo =
        TtlCache::new(ASSIGNEE_CACHE_CAPACITY, ASSIGNEE_CACHE_TTL);

    tracing::info!(job_id = job.id, entity_type = %kind, rows = rows.len(), "Import started");

    let mut counts = RowCounts::default();
    for row in &rows {
        match import_row(store, kind, row, &lookups, &mut assignees).await {
            Ok(()) => counts.succeeded += 1,
            Err(failures) => {
                counts.failed += 1;
                for failure in failures {
                    tracing::debug!(
                        job_id = job.id,
                        row = row.row,
                        field = %failure.field,
                        kind = %failure.kind,
                        "Row rejected"
                    );
                    store
                        .append_error(CreateImportError {
                            job_id: job.id,
                            row_number: row.row as i32,
                            field_name: failure.field,
                            kind: failure.kind,
                            message: failure.message,
                            original_value: failure.original_value,
                        })
                        .await?;
                }
            }
        }
        counts.processed += 1;
        if counts.processed % CHECKPOINT_INTERVAL == 0 {
            store.checkpoint_progress(job.id, counts).await?;
        }
    }

    Ok(counts)
}

/// Import one row. `Err` carries every failure the row produced; the row
/// then counts as failed exactly once.
async fn import_row<S>(
    store: &S,
    kind: EntityKind,
    row: &MappedRow,
    lookups: &LookupCache,
    assignees: &mut AssigneeMemo,
) -> Result<(), Vec<RowFailure>>
where
    S: ImportStore + ?Sized,
{
    // Start never requires a prior validate call, so the rule checks run
    // again here.
    let rule_errors = rules::validate_row(kind, row);
    if !rule_errors.is_empty() {
        return Err(rule_errors
            .into_iter()
            .map(|e| RowFailure {
                field: e.field,
                kind: e.kind,
                message: e.message,
                original_value: e.original_value,
            })
            .collect());
    }

    let written = match kind {
        EntityKind::Project => write_project(store, row).await,
        EntityKind::WorkItem => write_work_item(store, row, lookups, assignees).await,
        EntityKind::User => write_user(store, row).await,
    };
    written.map_err(|failure| vec![failure])
}

async fn write_project<S>(store: &S, row: &MappedRow) -> Result<(), RowFailure>
where
    S: ProjectStore + ?Sized,
{
    let project = NewProject {
        name: row.get(rules::FIELD_NAME).unwrap_or_default().to_string(),
        key: fields::normalize_project_key(row.get(rules::FIELD_KEY).unwrap_or_default()),
        description: row.get(rules::FIELD_DESCRIPTION).map(str::to_string),
    };
    store
        .insert_project(project)
        .await
        .map(|_| ())
        .map_err(|e| system_failure(row, e))
}

async fn write_work_item<S>(
    store: &S,
    row: &MappedRow,
    lookups: &LookupCache,
    assignees: &mut AssigneeMemo,
) -> Result<(), RowFailure>
where
    S: WorkItemStore + AccountStore + ?Sized,
{
    let project_ref = row.get(rules::FIELD_PROJECT).unwrap_or_default();
    let Some(project_id) = lookups.resolve_project(project_ref) else {
        return Err(reference_failure(
            rules::FIELD_PROJECT,
            format!("Project '{project_ref}' does not exist"),
            project_ref,
        ));
    };

    let assignee_id = match row.get(rules::FIELD_ASSIGNEE_EMAIL) {
        Some(email) => {
            let found = resolve_assignee(store, email, assignees)
                .await
                .map_err(|e| system_failure(row, e))?;
            match found {
                Some(id) => Some(id),
                None => {
                    return Err(reference_failure(
                        rules::FIELD_ASSIGNEE_EMAIL,
                        format!("No account matches '{email}'"),
                        email,
                    ));
                }
            }
        }
        None => None,
    };

    let item = NewWorkItem {
        project_id,
        title: row.get(rules::FIELD_TITLE).unwrap_or_default().to_string(),
        description: row.get(rules::FIELD_DESCRIPTION).map(str::to_string),
        type_id: lookups.resolve_item_type(row.get(rules::FIELD_TYPE)),
        status_id: lookups.resolve_status(row.get(rules::FIELD_STATUS)),
        priority_id: lookups.resolve_priority(row.get(rules::FIELD_PRIORITY)),
        estimate: row.get(rules::FIELD_ESTIMATE).and_then(fields::parse_estimate),
        due_date: row.get(rules::FIELD_DUE_DATE).and_then(fields::parse_date),
        assignee_id,
    };
    store
        .insert_work_item(item)
        .await
        .map(|_| ())
        .map_err(|e| system_failure(row, e))
}

/// Account lookup memoized per run. Uploads routinely repeat the same few
/// assignees for thousands of rows.
async fn resolve_assignee<S>(
    store: &S,
    email: &str,
    memo: &mut AssigneeMemo,
) -> Result<Option<DbId>, StoreError>
where
    S: AccountStore + ?Sized,
{
    let key = email.to_lowercase();
    if let Some(found) = memo.get(&key) {
        return Ok(*found);
    }
    let found = store.find_account_by_email(email).await?;
    memo.insert(key, found);
    Ok(found)
}

async fn write_user<S>(store: &S, row: &MappedRow) -> Result<(), RowFailure>
where
    S: AccountStore + ?Sized,
{
    let email = row.get(rules::FIELD_EMAIL).unwrap_or_default();
    let account_id = store
        .find_account_by_email(email)
        .await
        .map_err(|e| system_failure(row, e))?;
    let Some(account_id) = account_id else {
        return Err(reference_failure(
            rules::FIELD_EMAIL,
            format!("No account exists for '{email}'; accounts are provisioned through signup"),
            email,
        ));
    };

    let update = ProfileUpdate {
        display_name: row.get(rules::FIELD_DISPLAY_NAME).map(str::to_string),
        role: row.get(rules::FIELD_ROLE).map(str::to_string),
    };
    store
        .update_account_profile(account_id, update)
        .await
        .map_err(|e| system_failure(row, e))
}

fn reference_failure(field: &str, message: String, value: &str) -> RowFailure {
    RowFailure {
        field: field.to_string(),
        kind: RowErrorKind::Reference,
        message,
        original_value: Some(value.to_string()),
    }
}

/// The store failed mid-write: record the whole mapped row so the user can
/// retry it by hand.
fn system_failure(row: &MappedRow, error: StoreError) -> RowFailure {
    RowFailure {
        field: ROW_FIELD.to_string(),
        kind: RowErrorKind::System,
        message: error.to_string(),
        original_value: Some(row.to_json()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::{CreateImportJob, JobStore};
    use taskforge_core::job::ImportJobStatus;

    fn mapping(pairs: &[(&str, &str)]) -> taskforge_core::mapping::FieldMapping {
        pairs
            .iter()
            .map(|(field, column)| (field.to_string(), column.to_string()))
            .collect()
    }

    async fn claimed_job(
        store: &MemoryStore,
        entity_type: &str,
        source_text: &str,
        pairs: &[(&str, &str)],
    ) -> ImportJob {
        let job = store
            .create_job(CreateImportJob {
                entity_type: entity_type.to_string(),
                field_mapping: mapping(pairs),
                source_text: source_text.to_string(),
            })
            .await
            .unwrap();
        store.begin_import(job.id).await.unwrap().unwrap()
    }

    async fn job_after_run(store: &MemoryStore, job: ImportJob) -> ImportJob {
        let id = job.id;
        run_to_completion(store, job).await;
        store.find_job(id).await.unwrap().unwrap()
    }

    // -- terminal status tests ------------------------------------------------

    #[tokio::test]
    async fn reference_failures_still_complete_the_job() {
        let store = MemoryStore::with_default_reference_data();
        store.seed_project("Alpha", "AL1");

        // Ten rows; three reference a project that does not exist.
        let mut lines = vec!["Title,Project".to_string()];
        for i in 0..10 {
            let project = if i % 3 == 0 && i > 0 { "GHOST" } else { "AL1" };
            lines.push(format!("Task {i},{project}"));
        }
        let job = claimed_job(
            &store,
            "work_item",
            &lines.join("\n"),
            &[("title", "Title"), ("project", "Project")],
        )
        .await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.status, ImportJobStatus::Completed);
        assert_eq!(done.processed_rows, 10);
        assert_eq!(done.successful_rows, 7);
        assert_eq!(done.failed_rows, 3);

        let errors = store.list_errors(done.id, 100).await.unwrap();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .all(|e| e.kind == RowErrorKind::Reference && e.field_name == "project"));
    }

    #[tokio::test]
    async fn unknown_entity_type_fails_the_job_with_zero_rows() {
        let store = MemoryStore::with_default_reference_data();
        let job = claimed_job(&store, "widget", "Name\nX", &[("name", "Name")]).await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.status, ImportJobStatus::Failed);
        assert_eq!(done.processed_rows, 0);
        assert!(done.error_message.as_deref().unwrap().contains("widget"));
        assert!(done.completed_at.is_some());
    }

    // -- project import tests -------------------------------------------------

    #[tokio::test]
    async fn projects_are_inserted_with_normalized_keys() {
        let store = MemoryStore::with_default_reference_data();
        let job = claimed_job(
            &store,
            "project",
            "Name,Key\nAlpha,al1\nBeta,bt1",
            &[("name", "Name"), ("key", "Key")],
        )
        .await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.status, ImportJobStatus::Completed);
        assert_eq!(done.successful_rows, 2);
        assert_eq!(store.project_keys(), vec!["AL1", "BT1"]);
    }

    #[tokio::test]
    async fn unique_violation_at_write_time_is_a_system_error() {
        let store = MemoryStore::with_default_reference_data();
        store.seed_project("Existing", "AL1");

        let job = claimed_job(
            &store,
            "project",
            "Name,Key\nAlpha,AL1",
            &[("name", "Name"), ("key", "Key")],
        )
        .await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.status, ImportJobStatus::Completed);
        assert_eq!(done.failed_rows, 1);

        let errors = store.list_errors(done.id, 100).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, RowErrorKind::System);
        assert_eq!(errors[0].field_name, "row");
        // The serialized mapped row rides along for manual retry.
        let payload = errors[0].original_value.as_deref().unwrap();
        assert!(payload.contains("\"key\":\"AL1\""));
        assert!(payload.contains("\"name\":\"Alpha\""));
    }

    // -- work item import tests -----------------------------------------------

    #[tokio::test]
    async fn work_items_resolve_references_and_defaults() {
        let store = MemoryStore::with_default_reference_data();
        let project_id = store.seed_project("Alpha", "AL1");
        let account_id = store.seed_account("alice@example.com");

        let csv = "Title,Project,Status,Priority,Estimate,Due,Assignee\n\
                   Fix login,AL1,done,High,3.5,2025-06-01,alice@example.com\n\
                   Write docs,Alpha,Mystery,,8,,";
        let job = claimed_job(
            &store,
            "work_item",
            csv,
            &[
                ("title", "Title"),
                ("project", "Project"),
                ("status", "Status"),
                ("priority", "Priority"),
                ("estimate", "Estimate"),
                ("due_date", "Due"),
                ("assignee_email", "Assignee"),
            ],
        )
        .await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.status, ImportJobStatus::Completed);
        assert_eq!(done.successful_rows, 2);

        let items = store.work_items();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.project_id, project_id);
        assert_eq!(first.status_id, store.status_id("Done"));
        assert_eq!(first.priority_id, store.priority_id("High"));
        assert_eq!(first.estimate, Some(3.5));
        assert_eq!(first.due_date.map(|d| d.to_string()), Some("2025-06-01".into()));
        assert_eq!(first.assignee_id, Some(account_id));

        // Unknown status coerces to the default; absent priority stays none.
        let second = &items[1];
        assert_eq!(second.status_id, store.status_id("To Do"));
        assert_eq!(second.priority_id, None);
        assert_eq!(second.assignee_id, None);
        assert_eq!(second.type_id, store.default_item_type_id());
    }

    #[tokio::test]
    async fn unknown_assignee_is_a_reference_error() {
        let store = MemoryStore::with_default_reference_data();
        store.seed_project("Alpha", "AL1");

        let csv = "Title,Project,Assignee\nFix login,AL1,ghost@example.com";
        let job = claimed_job(
            &store,
            "work_item",
            csv,
            &[
                ("title", "Title"),
                ("project", "Project"),
                ("assignee_email", "Assignee"),
            ],
        )
        .await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.failed_rows, 1);
        let errors = store.list_errors(done.id, 100).await.unwrap();
        assert_eq!(errors[0].kind, RowErrorKind::Reference);
        assert_eq!(errors[0].field_name, "assignee_email");
        assert_eq!(
            errors[0].original_value.as_deref(),
            Some("ghost@example.com")
        );
    }

    #[tokio::test]
    async fn repeated_assignees_hit_the_store_once() {
        let store = MemoryStore::with_default_reference_data();
        store.seed_project("Alpha", "AL1");
        store.seed_account("alice@example.com");

        let mut lines = vec!["Title,Project,Assignee".to_string()];
        for i in 0..20 {
            lines.push(format!("Task {i},AL1,alice@example.com"));
        }
        let job = claimed_job(
            &store,
            "work_item",
            &lines.join("\n"),
            &[
                ("title", "Title"),
                ("project", "Project"),
                ("assignee_email", "Assignee"),
            ],
        )
        .await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.successful_rows, 20);
        assert_eq!(store.account_lookup_count(), 1);
    }

    // -- user import tests ----------------------------------------------------

    #[tokio::test]
    async fn user_rows_update_existing_profiles() {
        let store = MemoryStore::with_default_reference_data();
        let account_id = store.seed_account("alice@example.com");

        let csv = "Email,Name,Role\nalice@example.com,Alice A,admin";
        let job = claimed_job(
            &store,
            "user",
            csv,
            &[("email", "Email"), ("display_name", "Name"), ("role", "Role")],
        )
        .await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.status, ImportJobStatus::Completed);
        assert_eq!(done.successful_rows, 1);
        assert_eq!(
            store.account_profile(account_id),
            Some((Some("Alice A".to_string()), Some("admin".to_string())))
        );
    }

    #[tokio::test]
    async fn user_without_account_is_a_reference_error() {
        let store = MemoryStore::with_default_reference_data();
        let csv = "Email\nnobody@example.com";
        let job = claimed_job(&store, "user", csv, &[("email", "Email")]).await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.status, ImportJobStatus::Completed);
        assert_eq!(done.failed_rows, 1);
        let errors = store.list_errors(done.id, 100).await.unwrap();
        assert_eq!(errors[0].kind, RowErrorKind::Reference);
        assert!(errors[0].message.contains("signup"));
    }

    // -- loop mechanics tests -------------------------------------------------

    #[tokio::test]
    async fn progress_checkpoints_every_ten_rows() {
        let store = MemoryStore::with_default_reference_data();
        store.seed_project("Alpha", "AL1");

        let mut lines = vec!["Title,Project".to_string()];
        for i in 0..25 {
            lines.push(format!("Task {i},AL1"));
        }
        let job = claimed_job(
            &store,
            "work_item",
            &lines.join("\n"),
            &[("title", "Title"), ("project", "Project")],
        )
        .await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.processed_rows, 25);
        let processed_at_checkpoints: Vec<usize> = store
            .checkpoint_log()
            .iter()
            .map(|c| c.processed)
            .collect();
        assert_eq!(processed_at_checkpoints, vec![10, 20]);
    }

    #[tokio::test]
    async fn rule_failures_at_import_time_are_recorded_per_field() {
        let store = MemoryStore::with_default_reference_data();
        store.seed_project("Alpha", "AL1");

        // Missing title and a bad estimate: two error records, one failed row.
        let csv = "Title,Project,Estimate\n,AL1,soon";
        let job = claimed_job(
            &store,
            "work_item",
            csv,
            &[
                ("title", "Title"),
                ("project", "Project"),
                ("estimate", "Estimate"),
            ],
        )
        .await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.processed_rows, 1);
        assert_eq!(done.failed_rows, 1);
        let errors = store.list_errors(done.id, 100).await.unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == RowErrorKind::Validation));
        assert_eq!(store.work_items().len(), 0);
    }

    #[tokio::test]
    async fn empty_source_completes_with_zero_counts() {
        let store = MemoryStore::with_default_reference_data();
        let job = claimed_job(&store, "project", "", &[("name", "Name")]).await;
        let done = job_after_run(&store, job).await;

        assert_eq!(done.status, ImportJobStatus::Completed);
        assert_eq!(done.processed_rows, 0);
        assert_eq!(done.successful_rows, 0);
        assert_eq!(done.failed_rows, 0);
    }
}
