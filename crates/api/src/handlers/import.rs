//! Handlers for the CSV bulk import pipeline.
//!
//! Provides synchronous validation plus the job lifecycle: create a pending
//! job, start the background run, poll status with the persisted error log,
//! and list recent jobs.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use taskforge_core::error::CoreError;
use taskforge_core::job::ImportJobStatus;
use taskforge_core::mapping::FieldMapping;
use taskforge_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use taskforge_core::report::MAX_REPORT_ERRORS;
use taskforge_core::rules::EntityKind;
use taskforge_core::types::DbId;
use taskforge_import::importer;
use taskforge_import::store::{CreateImportJob, ImportErrorRecord, ImportJob};
use taskforge_import::validator;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request and query parameter structs
// ---------------------------------------------------------------------------

/// Request body for synchronous CSV validation.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub entity_type: String,
    pub csv_data: String,
    pub field_mapping: FieldMapping,
}

/// Request body for creating an import job.
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub entity_type: String,
    pub csv_data: String,
    pub field_mapping: FieldMapping,
}

/// Query parameters for listing jobs.
#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Job status together with its persisted error log.
#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    pub job: ImportJob,
    pub errors: Vec<ImportErrorRecord>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /import/validate
///
/// Parse and validate CSV data against the rule set for `entity_type`,
/// returning the full report without writing anything.
pub async fn validate_csv(
    State(state): State<AppState>,
    Json(input): Json<ValidateRequest>,
) -> AppResult<impl IntoResponse> {
    let kind = EntityKind::from_str(&input.entity_type).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown entity type '{}'", input.entity_type))
    })?;

    if input.csv_data.trim().is_empty() {
        return Err(AppError::BadRequest("CSV data cannot be empty".to_string()));
    }

    let report = validator::validate(
        state.store.as_ref(),
        kind,
        &input.csv_data,
        &input.field_mapping,
    )
    .await?;

    tracing::debug!(
        entity_type = %kind,
        total_rows = report.total_rows,
        valid_rows = report.valid_rows,
        "CSV validated"
    );

    Ok(Json(DataResponse { data: report }))
}

/// POST /import/jobs
///
/// Create a new import job in 'pending' status, carrying the CSV text and
/// field mapping. Unknown entity types are accepted here; the import run
/// rejects them when it starts.
pub async fn create_job(
    State(state): State<AppState>,
    Json(input): Json<CreateJobRequest>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .store
        .create_job(CreateImportJob {
            entity_type: input.entity_type,
            field_mapping: input.field_mapping,
            source_text: input.csv_data,
        })
        .await?;

    tracing::info!(job_id = job.id, entity_type = %job.entity_type, "Import job created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

/// POST /import/jobs/{id}/start
///
/// Claim a pending job and spawn the background import, replying 202 with
/// the claimed job. A job that is missing yields 404; one that has already
/// left 'pending' yields 409.
pub async fn start_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .store
        .find_job(id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "ImportJob", id }))?;

    if job.status != ImportJobStatus::Pending {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Import job {id} is not pending (status: {})",
            job.status
        ))));
    }

    // The claim can still lose to a concurrent start between the check above
    // and this update; the store hands the job to exactly one caller.
    let Some(claimed) = state.store.begin_import(id).await? else {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Import job {id} is not pending"
        ))));
    };

    importer::spawn_import(Arc::clone(&state.store), claimed.clone());

    tracing::info!(job_id = id, entity_type = %claimed.entity_type, "Import job started");

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: claimed })))
}

/// GET /import/jobs/{id}
///
/// Get a job with up to the first `MAX_REPORT_ERRORS` of its error log,
/// ordered by row number.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .store
        .find_job(id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "ImportJob", id }))?;

    let errors = state.store.list_errors(id, MAX_REPORT_ERRORS as i64).await?;

    Ok(Json(DataResponse {
        data: JobDetailResponse { job, errors },
    }))
}

/// GET /import/jobs?limit=&offset=
///
/// List import jobs, newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);

    let jobs = state.store.list_recent_jobs(limit, offset).await?;

    Ok(Json(DataResponse { data: jobs }))
}
