//! JSON API handlers
//!
//! Transport-agnostic request handling: each handler takes a parsed JSON
//! body and returns a status code with a JSON body. Failures render as
//! `{"error": <code>, "details": <json>}`; internal faults never leak their
//! message to the caller.

use crate::store::ManifestStore;
use crate::submission::{submit, SubmitOptions};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tessera_core::{Catalog, PackageRef, RegistryError};
use tessera_resolve::{resolve, ResolveOptions};
use tracing::{debug, error};

/// Status code plus JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Value,
}

impl ApiResponse {
    fn success<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status, body },
            Err(e) => Self::failure(&RegistryError::internal(format!(
                "response serialization failed: {e}"
            ))),
        }
    }

    /// Error envelope for `err`
    pub fn failure(err: &RegistryError) -> Self {
        if err.is_internal() {
            error!(code = err.code(), error = %err, "internal error");
        } else {
            debug!(code = err.code(), error = %err, "request failed");
        }
        Self {
            status: err.http_status(),
            body: json!({ "error": err.code(), "details": err.details() }),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Body of `POST /resolve`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveRequest {
    /// Record to resolve
    pub root: PackageRef,
    /// Records the caller already has
    #[serde(default)]
    pub installed: Vec<PackageRef>,
}

impl ResolveRequest {
    /// Decode a request body, reporting decode failures as schema errors
    pub fn from_value(body: &Value) -> tessera_core::Result<Self> {
        Self::deserialize(body).map_err(|e| RegistryError::schema("request", e.to_string()))
    }
}

/// `POST /resolve`: `200 {plan, satisfies, missing}` or an error envelope
pub fn handle_resolve(body: &Value, catalog: &Catalog, options: &ResolveOptions) -> ApiResponse {
    let request = match ResolveRequest::from_value(body) {
        Ok(request) => request,
        Err(e) => return ApiResponse::failure(&e),
    };
    let mut installed = options.installed.clone();
    installed.extend(request.installed);
    let options = options.clone().with_installed(installed);

    match resolve(&request.root, catalog, &options) {
        Ok(outcome) => ApiResponse::success(200, &outcome),
        Err(e) => ApiResponse::failure(&e),
    }
}

/// Manifest submission: `201 {id, version, canonical_uri, canonical_digest}`
pub fn handle_submit(body: &Value, store: &dyn ManifestStore, options: &SubmitOptions) -> ApiResponse {
    match submit(body, store, options) {
        Ok(receipt) => ApiResponse::success(201, &receipt),
        Err(e) => ApiResponse::failure(&e),
    }
}
