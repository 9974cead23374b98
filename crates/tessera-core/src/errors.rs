//! Unified error taxonomy for Tessera
//!
//! Every failure the registry core can report is one variant of
//! [`RegistryError`]. Each variant carries a stable wire code, an HTTP status
//! for the outer API layer, and structured details that pinpoint the failing
//! field or node.

use crate::identifiers::{InterfaceRef, PackageId, PackageRef};
use crate::manifest::VersionRange;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Category of a single validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Structural problem: missing, unknown or malformed field
    Schema,
    /// `artifact.digest` does not match the digest grammar
    Digest,
    /// `artifact.uri` uses a rejected scheme
    Uri,
}

/// One problem found by the manifest validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON path of the offending field, e.g. `dependencies[0].id`
    pub field: String,
    /// Category of the problem
    pub kind: IssueKind,
    /// Human-readable description
    pub message: String,
}

impl ValidationIssue {
    /// Create a schema issue
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: IssueKind::Schema,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A dependency edge no catalog version could satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedDependency {
    /// Package declaring the edge
    pub from: PackageRef,
    /// Package the edge points at
    pub id: PackageId,
    /// Requested range
    pub range: VersionRange,
}

impl fmt::Display for UnresolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} {}", self.from, self.id, self.range)
    }
}

/// What a `not_found` failure could not find
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Missing {
    /// An exact record, e.g. the resolve root
    Package {
        /// The absent record
        package: PackageRef,
    },
    /// Dependency edges with no satisfying version
    UnresolvedDependencies {
        /// Every edge that could not be satisfied
        edges: Vec<UnresolvedDependency>,
    },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Package { package } => write!(f, "{package}"),
            Missing::UnresolvedDependencies { edges } => {
                write!(f, "no satisfying version for {}", join(edges))
            }
        }
    }
}

/// Why a dependency graph cannot be installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictKind {
    /// A back-edge to a node still on the walk path
    Cycle {
        /// Node whose dependency closed the cycle
        from: PackageRef,
        /// Ancestor that reappeared
        to: PackageRef,
    },
    /// Two edges selected different versions of the same package
    VersionClash {
        /// Package with conflicting selections
        id: PackageId,
        /// Version selected first
        existing: semver::Version,
        /// Version the later edge selected
        requested: semver::Version,
        /// Package declaring the later edge
        requested_by: PackageRef,
    },
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Cycle { from, to } => write!(f, "cycle: {from} depends on ancestor {to}"),
            ConflictKind::VersionClash {
                id,
                existing,
                requested,
                requested_by,
            } => write!(
                f,
                "{id} resolved to {existing} but {requested_by} selects {requested}"
            ),
        }
    }
}

/// Unified error type for registry operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// Structural validation failure
    #[error("invalid schema: {}", join(.issues))]
    InvalidSchema {
        /// Every issue the validator found
        issues: Vec<ValidationIssue>,
    },

    /// Artifact digest is malformed
    #[error("invalid digest: {}", join(.issues))]
    InvalidDigest {
        /// Every issue the validator found
        issues: Vec<ValidationIssue>,
    },

    /// Artifact URI is malformed
    #[error("invalid uri: {}", join(.issues))]
    InvalidUri {
        /// Every issue the validator found
        issues: Vec<ValidationIssue>,
    },

    /// Signature is malformed, missing under a reject policy, or does not verify
    #[error("invalid signature for {package}: {reason}")]
    InvalidSignature {
        /// Manifest whose signature failed
        package: PackageRef,
        /// Why the signature was rejected
        reason: String,
    },

    /// Root or dependency absent from the catalog
    #[error("not found: {missing}")]
    NotFound {
        /// What could not be found
        missing: Missing,
    },

    /// Cycle or version clash in the dependency graph
    #[error("dependency conflict: {conflict}")]
    DependencyConflict {
        /// The conflicting structure
        conflict: ConflictKind,
    },

    /// Graph deeper than the configured bound
    #[error("resolve depth exceeded: {node} at depth {depth} (max {max_depth})")]
    ResolveDepthExceeded {
        /// First node found beyond the bound
        node: PackageRef,
        /// Its depth from the root
        depth: usize,
        /// Configured bound
        max_depth: usize,
    },

    /// Required interfaces not provided by the resolved set
    #[error("missing requirements: {}", join(.missing))]
    MissingRequirements {
        /// Interfaces nobody provides
        missing: Vec<InterfaceRef>,
    },

    /// `(id, version)` already registered
    #[error("already exists: {package}")]
    AlreadyExists {
        /// The duplicate record
        package: PackageRef,
    },

    /// Configuration could not be loaded or is out of range
    #[error("invalid config: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// Unexpected fault
    #[error("internal error: {message}")]
    Internal {
        /// Detailed message, logged but never sent to callers
        message: String,
    },
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RegistryError {
    /// Single schema issue
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            issues: vec![ValidationIssue::schema(field, message)],
        }
    }

    /// Build the error for a failed validation report.
    ///
    /// The variant follows the kind of the first issue; every issue is kept.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        match issues.first().map(|issue| issue.kind) {
            Some(IssueKind::Digest) => Self::InvalidDigest { issues },
            Some(IssueKind::Uri) => Self::InvalidUri { issues },
            _ => Self::InvalidSchema { issues },
        }
    }

    /// Signature failure for `package`
    pub fn invalid_signature(package: PackageRef, reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            package,
            reason: reason.into(),
        }
    }

    /// Exact record absent
    pub fn package_not_found(package: PackageRef) -> Self {
        Self::NotFound {
            missing: Missing::Package { package },
        }
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable wire code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSchema { .. } => "invalid_schema",
            Self::InvalidDigest { .. } => "invalid_digest",
            Self::InvalidUri { .. } => "invalid_uri",
            Self::InvalidSignature { .. } => "invalid_signature",
            Self::NotFound { .. } => "not_found",
            Self::DependencyConflict { .. } => "dependency_conflict",
            Self::ResolveDepthExceeded { .. } => "resolve_depth_exceeded",
            Self::MissingRequirements { .. } => "missing_requirements",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Config { .. } => "invalid_config",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// HTTP status the API layer answers with
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidSchema { .. }
            | Self::InvalidDigest { .. }
            | Self::InvalidUri { .. }
            | Self::InvalidSignature { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::AlreadyExists { .. } => 409,
            Self::DependencyConflict { .. }
            | Self::ResolveDepthExceeded { .. }
            | Self::MissingRequirements { .. } => 422,
            Self::Config { .. } | Self::Internal { .. } => 500,
        }
    }

    /// Whether this is an unexpected fault hidden from callers
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. } | Self::Config { .. })
    }

    /// Structured details for the response body.
    ///
    /// Internal faults collapse to a generic message.
    pub fn details(&self) -> serde_json::Value {
        match self {
            Self::InvalidSchema { issues }
            | Self::InvalidDigest { issues }
            | Self::InvalidUri { issues } => json!({ "issues": issues }),
            Self::InvalidSignature { package, reason } => {
                json!({ "package": package, "reason": reason })
            }
            Self::NotFound { missing } => json!(missing),
            Self::DependencyConflict { conflict } => json!(conflict),
            Self::ResolveDepthExceeded {
                node,
                depth,
                max_depth,
            } => json!({ "node": node, "depth": depth, "max_depth": max_depth }),
            Self::MissingRequirements { missing } => json!({ "missing": missing }),
            Self::AlreadyExists { package } => json!({ "package": package }),
            Self::Config { .. } | Self::Internal { .. } => json!({ "message": "internal error" }),
        }
    }
}

/// Standard result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
