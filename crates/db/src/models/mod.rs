//! Row structs for the persistence layer.
//!
//! Each submodule contains `FromRow` structs matching the database rows plus
//! conversions into the domain types used by `taskforge-import`.

pub mod import;
pub mod project;
pub mod reference;
