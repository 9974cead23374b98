//! Manifest record
//!
//! The typed form of a published bundle manifest. The schema is closed at
//! every level: decoding a document with an unknown field fails instead of
//! silently dropping it, so the bytes a publisher signed and the record the
//! store keeps cannot disagree about which fields exist.

use crate::errors::{RegistryError, Result};
use crate::identifiers::{ArtifactUri, ChainId, ContentDigest, InterfaceRef, PackageId, PackageRef};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Published bundle manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Reverse-domain package identifier
    pub id: PackageId,
    /// Exact semantic version of this record
    pub version: Version,
    /// Chains the bundle targets
    pub chains: Vec<ChainId>,
    /// The WASM artifact this manifest describes
    pub artifact: Artifact,
    /// Interfaces this bundle implements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<InterfaceRef>,
    /// Interfaces this bundle needs from something in its resolved set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<InterfaceRef>,
    /// Package dependencies expressed as version ranges
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    /// Detached publisher signature over the canonical form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<ManifestSignature>,
}

impl Manifest {
    /// `id@version` reference for this record
    pub fn package_ref(&self) -> PackageRef {
        PackageRef::new(self.id.clone(), self.version.clone())
    }

    /// Whether the manifest carries a signature block
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Serialize to a JSON document
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| RegistryError::internal(format!("manifest serialization failed: {e}")))
    }

    /// Decode a JSON document without running the schema validator.
    ///
    /// Callers accepting untrusted input should go through the validator
    /// first so every problem is reported, not just serde's first one.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| RegistryError::schema("manifest", e.to_string()))
    }
}

/// Artifact descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Artifact {
    /// Artifact kind, e.g. `wasm`
    #[serde(rename = "type")]
    pub kind: String,
    /// Execution target, e.g. `wasm32-wasi`
    pub target: String,
    /// Content digest of the artifact bytes
    pub digest: ContentDigest,
    /// Where the artifact can be fetched
    pub uri: ArtifactUri,
}

/// Dependency edge on another package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    /// Package the edge points at
    pub id: PackageId,
    /// Acceptable versions
    pub range: VersionRange,
}

/// Semantic version range that remembers how it was written.
///
/// `semver::VersionReq` normalizes its display form, which would change the
/// canonical bytes of a signed manifest. The literal text is kept and
/// serialized back verbatim; matching uses the parsed requirement.
#[derive(Debug, Clone)]
pub struct VersionRange {
    text: String,
    req: VersionReq,
}

impl VersionRange {
    /// Parse a range such as `^1.2.0` or `>=1.0.0, <2.0.0`
    pub fn parse(text: &str) -> std::result::Result<Self, semver::Error> {
        let req = VersionReq::parse(text)?;
        Ok(Self {
            text: text.to_string(),
            req,
        })
    }

    /// Whether `version` falls inside the range
    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(version)
    }

    /// The range as written by the publisher
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for VersionRange {}

impl FromStr for VersionRange {
    type Err = semver::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Signature block attached to a manifest.
///
/// Members are optional at the type level so that a block missing `alg`,
/// `pubkey` or `sig` still decodes and the verifier can report it as
/// malformed rather than as a generic schema failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestSignature {
    /// Signature algorithm, `ed25519`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Public key, optionally prefixed with `ed25519:`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    /// Signature bytes, optionally prefixed with `base64:` or `hex:`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    /// When the publisher signed, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<String>,
}
