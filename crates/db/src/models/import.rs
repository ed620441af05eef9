//! Rows from the `import_jobs` and `import_errors` tables.

use sqlx::FromRow;
use taskforge_core::job::ImportJobStatus;
use taskforge_core::report::RowErrorKind;
use taskforge_core::types::{DbId, Timestamp};
use taskforge_import::store::{ImportErrorRecord, ImportJob};

// ── Import Jobs ──────────────────────────────────────────────────────

/// A row from the `import_jobs` table.
///
/// `field_mapping` is stored as JSONB and `status` as text; both are decoded
/// into their domain forms by [`ImportJobRow::into_domain`].
#[derive(Debug, Clone, FromRow)]
pub struct ImportJobRow {
    pub id: DbId,
    pub entity_type: String,
    pub field_mapping: serde_json::Value,
    pub source_text: String,
    pub status: String,
    pub processed_rows: i32,
    pub successful_rows: i32,
    pub failed_rows: i32,
    pub error_message: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ImportJobRow {
    /// Convert into the domain job type.
    ///
    /// The status column is constrained by a CHECK to the known values; an
    /// unrecognized value decodes as [`ImportJobStatus::Failed`]. A mapping
    /// that fails to decode becomes an empty mapping.
    pub fn into_domain(self) -> ImportJob {
        let status = ImportJobStatus::from_str(&self.status).unwrap_or_else(|| {
            tracing::warn!(
                job_id = self.id,
                status = %self.status,
                "Unrecognized import job status in storage"
            );
            ImportJobStatus::Failed
        });
        ImportJob {
            id: self.id,
            entity_type: self.entity_type,
            field_mapping: serde_json::from_value(self.field_mapping).unwrap_or_default(),
            source_text: self.source_text,
            status,
            processed_rows: self.processed_rows,
            successful_rows: self.successful_rows,
            failed_rows: self.failed_rows,
            error_message: self.error_message,
            started_at: self.started_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// ── Import Errors ────────────────────────────────────────────────────

/// A row from the `import_errors` table.
#[derive(Debug, Clone, FromRow)]
pub struct ImportErrorRow {
    pub id: DbId,
    pub job_id: DbId,
    pub row_number: i32,
    pub field_name: String,
    pub error_type: String,
    pub message: String,
    pub original_value: Option<String>,
    pub created_at: Timestamp,
}

impl ImportErrorRow {
    /// Convert into the domain record. An unrecognized `error_type` decodes
    /// as [`RowErrorKind::System`].
    pub fn into_domain(self) -> ImportErrorRecord {
        ImportErrorRecord {
            id: self.id,
            job_id: self.job_id,
            row_number: self.row_number,
            field_name: self.field_name,
            kind: RowErrorKind::from_str(&self.error_type).unwrap_or(RowErrorKind::System),
            message: self.message,
            original_value: self.original_value,
            created_at: self.created_at,
        }
    }
}
