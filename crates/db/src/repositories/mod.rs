//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod account_repo;
pub mod import_error_repo;
pub mod import_job_repo;
pub mod project_repo;
pub mod reference_repo;
pub mod work_item_repo;

pub use account_repo::AccountRepo;
pub use import_error_repo::ImportErrorRepo;
pub use import_job_repo::ImportJobRepo;
pub use project_repo::ProjectRepo;
pub use reference_repo::ReferenceRepo;
pub use work_item_repo::WorkItemRepo;
