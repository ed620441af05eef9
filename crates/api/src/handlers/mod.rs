//! HTTP request handlers, grouped by resource.

pub mod import;
