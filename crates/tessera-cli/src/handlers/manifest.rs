//! Manifest commands

use crate::io::{read_json, read_manifest, read_signing_key, write_or_return};
use anyhow::{bail, Context, Result};
use std::path::Path;
use tessera_core::canonical::strip_transport_fields;
use tessera_core::{canonical_digest, canonicalize};
use tessera_manifest::{sign, validate, verify, SignatureError};
use tracing::info;

/// Sign a manifest file with a hex secret key
pub fn sign_file(
    manifest: &Path,
    key: &Path,
    signed_at: Option<String>,
    output: Option<&Path>,
) -> Result<String> {
    let unsigned = read_manifest(manifest)?;
    let key = read_signing_key(key)?;
    let signed = sign(&unsigned, &key, signed_at).context("signing failed")?;
    info!(id = %signed.package_ref(), "manifest signed");

    let text = serde_json::to_string_pretty(&signed.to_value()?)?;
    write_or_return(output, text)
}

/// Verify the signature of a manifest file
pub fn verify_file(manifest: &Path) -> Result<String> {
    let manifest = read_manifest(manifest)?;
    let package = manifest.package_ref();
    match verify(&manifest) {
        Ok(true) => Ok(format!("{package}: signature valid")),
        Ok(false) => bail!("{package}: signature does not verify"),
        Err(SignatureError::Unsigned) => bail!("{package}: manifest is not signed"),
        Err(e) => bail!("{package}: {e}"),
    }
}

/// Validate a manifest file, listing every issue
pub fn validate_file(manifest: &Path) -> Result<String> {
    let raw = strip_transport_fields(&read_json(manifest)?);
    let report = validate(&raw);
    if report.valid {
        return Ok(format!("{}: valid", manifest.display()));
    }
    let issues: Vec<String> = report
        .errors
        .iter()
        .map(|issue| format!("  {issue}"))
        .collect();
    bail!(
        "{}: {} issue(s)\n{}",
        manifest.display(),
        issues.len(),
        issues.join("\n")
    )
}

/// Canonical bytes of a manifest file, or their digest
pub fn canonicalize_file(manifest: &Path, digest: bool) -> Result<String> {
    let manifest = read_manifest(manifest)?;
    if digest {
        return Ok(canonical_digest(&manifest)?.to_string());
    }
    let bytes = canonicalize(&manifest)?;
    Ok(String::from_utf8(bytes).context("canonical form is not UTF-8")?)
}
