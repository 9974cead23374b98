//! Canonical form of a manifest
//!
//! The signing payload is compact JSON with object keys sorted
//! lexicographically at every nesting level. Array order is preserved. The
//! `signature` block and transport-only fields are dropped from the top level
//! before serialization, so they can never influence what gets signed.
//! Empty top-level list fields are dropped too: a document that writes
//! `"provides": []` and one that omits `provides` canonicalize identically.
//!
//! The writer below does its own key ordering instead of relying on the
//! iteration order of `serde_json::Map`, which changes when any crate in the
//! build enables `preserve_order`.

use crate::errors::{RegistryError, Result};
use crate::identifiers::ContentDigest;
use crate::manifest::Manifest;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Top-level field holding the detached signature
pub const SIGNATURE_FIELD: &str = "signature";

/// Top-level fields that exist only on the wire (upload payloads, overwrite
/// flags) and are never part of the signed record
pub const TRANSPORT_FIELDS: &[&str] = &["overwrite", "payload", "wasm_base64"];

/// Top-level list fields where empty and absent mean the same thing
pub const LIST_FIELDS: &[&str] = &["provides", "requires", "dependencies"];

/// Canonical bytes of a typed manifest
pub fn canonicalize(manifest: &Manifest) -> Result<Vec<u8>> {
    canonicalize_value(&manifest.to_value()?)
}

/// Canonical bytes of a raw manifest document
pub fn canonicalize_value(value: &Value) -> Result<Vec<u8>> {
    let mut out = String::new();
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map
                .iter()
                .filter(|(key, value)| !is_excluded(key) && !is_empty_list_field(key, value))
                .collect();
            write_object(&mut entries, &mut out)?;
        }
        other => write_value(other, &mut out)?,
    }
    Ok(out.into_bytes())
}

/// `sha256:<hex>` of the canonical bytes
pub fn canonical_digest(manifest: &Manifest) -> Result<ContentDigest> {
    let bytes = canonicalize(manifest)?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(&bytes));
    Ok(ContentDigest::from_sha256(&hash))
}

/// Remove only transport-only fields, keeping the signature block
pub fn strip_transport_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !TRANSPORT_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_excluded(key: &str) -> bool {
    key == SIGNATURE_FIELD || TRANSPORT_FIELDS.contains(&key)
}

fn is_empty_list_field(key: &str, value: &Value) -> bool {
    LIST_FIELDS.contains(&key) && matches!(value, Value::Array(items) if items.is_empty())
}

fn write_value(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            write_object(&mut entries, out)
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
            Ok(())
        }
        scalar => {
            let text = serde_json::to_string(scalar)
                .map_err(|e| RegistryError::internal(format!("canonical encoding failed: {e}")))?;
            out.push_str(&text);
            Ok(())
        }
    }
}

fn write_object(entries: &mut [(&String, &Value)], out: &mut String) -> Result<()> {
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    out.push('{');
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let key = serde_json::to_string(key)
            .map_err(|e| RegistryError::internal(format!("canonical encoding failed: {e}")))?;
        out.push_str(&key);
        out.push(':');
        write_value(value, out)?;
    }
    out.push('}');
    Ok(())
}
