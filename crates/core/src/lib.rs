//! Pure domain logic for the TaskForge bulk import pipeline.
//!
//! Everything in this crate is deterministic and free of I/O: no database,
//! no async, no network. The import pipeline crate composes these pieces;
//! the API crate only ever sees their outputs.

pub mod cache;
pub mod csv;
pub mod error;
pub mod fields;
pub mod job;
pub mod mapping;
pub mod pagination;
pub mod report;
pub mod rules;
pub mod types;
