//! The success-response envelope.
//!
//! Every 2xx body is `{ "data": ... }`; error bodies are the
//! `{ "error", "code" }` shape produced in [`crate::error`]. Clients can
//! branch on which key is present without inspecting the status code first.

use serde::Serialize;

/// Typed `{ "data": T }` wrapper. Handlers return
/// `Json(DataResponse { data })` rather than assembling the envelope with
/// `serde_json::json!`, so the payload type stays visible in signatures.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
