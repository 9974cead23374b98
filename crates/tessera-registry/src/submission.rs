//! Manifest submission
//!
//! Pipeline for a publisher's upload: drop transport-only fields, validate
//! the closed schema, decode, apply the signature policy, then insert
//! atomically. A record is either stored whole or not at all.

use crate::store::ManifestStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::canonical::strip_transport_fields;
use tessera_core::{
    canonical_digest, ContentDigest, Manifest, PackageId, RegistryConfig, Result, UnsignedPolicy,
    Version,
};
use tessera_manifest::{check_signature, parse_manifest, SignatureStatus};
use tracing::{info, warn};

/// Policy for accepting submissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Whether unsigned manifests may be stored
    pub unsigned_policy: UnsignedPolicy,
    /// Prefix of canonical record URIs, without trailing slash
    pub base_url: String,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

impl SubmitOptions {
    /// Options taken from the registry configuration
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            unsigned_policy: config.unsigned_policy,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base_url}/manifests/{id}/{version}`
    pub fn canonical_uri(&self, manifest: &Manifest) -> String {
        format!(
            "{}/manifests/{}/{}",
            self.base_url, manifest.id, manifest.version
        )
    }
}

/// Acknowledgement of a stored manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Stored package id
    pub id: PackageId,
    /// Stored version
    pub version: Version,
    /// Where the record can be fetched
    pub canonical_uri: String,
    /// SHA-256 of the canonical bytes
    pub canonical_digest: ContentDigest,
}

/// Validate, check and store one raw manifest document
pub fn submit(
    raw: &Value,
    store: &dyn ManifestStore,
    options: &SubmitOptions,
) -> Result<SubmissionReceipt> {
    let record = strip_transport_fields(raw);
    let manifest = parse_manifest(&record).map_err(|e| {
        warn!(code = e.code(), error = %e, "submission rejected by validation");
        e
    })?;
    let package = manifest.package_ref();

    let status = check_signature(&manifest, options.unsigned_policy).map_err(|e| {
        warn!(id = %package, code = e.code(), error = %e, "submission rejected by signature check");
        e
    })?;
    let digest = canonical_digest(&manifest)?;
    let canonical_uri = options.canonical_uri(&manifest);

    store.insert_if_absent(manifest).map_err(|e| {
        warn!(id = %package, code = e.code(), "submission rejected by store");
        e
    })?;

    info!(
        id = %package,
        signed = status == SignatureStatus::Verified,
        digest = %digest,
        "manifest stored"
    );
    Ok(SubmissionReceipt {
        id: package.id,
        version: package.version,
        canonical_uri,
        canonical_digest: digest,
    })
}
