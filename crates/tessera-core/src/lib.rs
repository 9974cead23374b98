//! Tessera Core - manifest model for the bundle registry
//!
//! Foundation types shared by every Tessera crate:
//!
//! - [`Manifest`]: the closed-schema record describing one published bundle
//!   version, with validated identifier newtypes for every patterned field
//! - [`Catalog`]: an immutable snapshot of published manifests indexed by
//!   `id` and version, supplied by the store to every resolve call
//! - [`canonical`]: the deterministic byte form used as the signing payload
//! - [`RegistryError`]: the error taxonomy surfaced to API callers
//! - [`RegistryConfig`]: policies (depth bound, unsigned handling) as explicit
//!   configuration
//!
//! Everything here is synchronous and free of I/O except configuration
//! loading.

#![forbid(unsafe_code)]

/// Deterministic canonical form and digests
pub mod canonical;

/// Immutable catalog snapshot
pub mod catalog;

/// Registry configuration
pub mod config;

/// Error taxonomy
pub mod errors;

/// Validated identifier newtypes and schema patterns
pub mod identifiers;

/// Manifest record types
pub mod manifest;

pub use canonical::{canonical_digest, canonicalize, canonicalize_value};
pub use catalog::Catalog;
pub use config::{RegistryConfig, UnsignedPolicy, DEFAULT_MAX_RESOLVE_DEPTH};
pub use errors::{
    ConflictKind, IssueKind, Missing, RegistryError, Result, UnresolvedDependency,
    ValidationIssue,
};
pub use identifiers::{
    ArtifactUri, ChainId, ContentDigest, IdentifierError, InterfaceRef, PackageId, PackageRef,
};
pub use manifest::{Artifact, Dependency, Manifest, ManifestSignature, VersionRange};

pub use semver::Version;
