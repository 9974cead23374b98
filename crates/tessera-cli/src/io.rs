//! File loading for the CLI
//!
//! Manifests are JSON documents; a catalog is either a directory of `.json`
//! files or a single file holding one manifest or an array of them. Signing
//! keys are 32-byte secrets stored as hex text.

use anyhow::{anyhow, bail, Context, Result};
use ed25519_dalek::SigningKey;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tessera_core::canonical::strip_transport_fields;
use tessera_core::{Catalog, Manifest};
use tessera_manifest::parse_manifest;
use tracing::debug;

/// Read and parse a JSON file
pub fn read_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("unable to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Read, validate and decode one manifest file
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let raw = read_json(path)?;
    decode_manifest(&raw).with_context(|| format!("invalid manifest {}", path.display()))
}

fn decode_manifest(raw: &Value) -> Result<Manifest> {
    Ok(parse_manifest(&strip_transport_fields(raw))?)
}

/// Load a catalog from a directory of manifests or a JSON file
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let documents = if path.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(path)
            .with_context(|| format!("unable to list {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        files
            .iter()
            .map(|file| read_json(file).map(|doc| (file.display().to_string(), doc)))
            .collect::<Result<Vec<_>>>()?
    } else {
        match read_json(path)? {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, doc)| (format!("{}[{i}]", path.display()), doc))
                .collect(),
            doc => vec![(path.display().to_string(), doc)],
        }
    };

    let mut catalog = Catalog::new();
    for (origin, doc) in documents {
        let manifest = decode_manifest(&doc).with_context(|| format!("invalid manifest {origin}"))?;
        debug!(id = %manifest.package_ref(), origin, "loaded manifest");
        catalog
            .insert(manifest)
            .with_context(|| format!("duplicate manifest {origin}"))?;
    }
    Ok(catalog)
}

/// Read a hex-encoded Ed25519 secret key
pub fn read_signing_key(path: &Path) -> Result<SigningKey> {
    let text =
        fs::read_to_string(path).with_context(|| format!("unable to read {}", path.display()))?;
    let bytes = hex::decode(text.trim()).context("signing key is not hex")?;
    let secret: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow!("signing key must be 32 bytes, got {}", b.len()))?;
    Ok(SigningKey::from_bytes(&secret))
}

/// Write `contents` to `path`, or return it for stdout when `path` is absent
pub fn write_or_return(path: Option<&Path>, contents: String) -> Result<String> {
    match path {
        Some(path) => {
            if path.exists() && path.is_dir() {
                bail!("{} is a directory", path.display());
            }
            fs::write(path, format!("{contents}\n"))
                .with_context(|| format!("unable to write {}", path.display()))?;
            Ok(format!("wrote {}", path.display()))
        }
        None => Ok(contents),
    }
}

/// Write secret key material to `path`, readable only by the owner on unix
pub fn write_secret(path: &Path, contents: &str) -> Result<String> {
    if path.is_dir() {
        bail!("{} is a directory", path.display());
    }
    let mut file = secret_options()
        .open(path)
        .with_context(|| format!("unable to create {}", path.display()))?;
    restrict_permissions(path)?;
    writeln!(file, "{contents}").with_context(|| format!("unable to write {}", path.display()))?;
    Ok(format!("wrote {}", path.display()))
}

#[cfg(unix)]
fn secret_options() -> fs::OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true).mode(0o600);
    options
}

#[cfg(not(unix))]
fn secret_options() -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    options
}

// `mode` only applies when the file is created; an existing file keeps its bits.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("unable to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
