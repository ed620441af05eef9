//! The TaskForge bulk import pipeline.
//!
//! Validation and import of delimited-text uploads for the three importable
//! entity kinds (work items, projects, users). The pipeline talks to
//! storage through the narrow traits in [`store`]; PostgreSQL implements
//! them in `taskforge-db`, and [`memory::MemoryStore`] implements them for
//! tests and local development.

pub mod importer;
pub mod lookup;
pub mod memory;
pub mod store;
pub mod validator;
