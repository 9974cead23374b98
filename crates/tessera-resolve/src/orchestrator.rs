//! Resolution orchestration
//!
//! The single entry point external callers use: re-validate, check
//! signatures, walk the graph, check interfaces. Each stage sees only records
//! that passed the previous one.

use crate::graph::{DependencyGraphResolver, PlanEntry, ResolutionNode};
use crate::interfaces;
use serde::Serialize;
use tessera_core::{
    Catalog, InterfaceRef, Manifest, PackageRef, RegistryConfig, RegistryError, Result,
    UnsignedPolicy, DEFAULT_MAX_RESOLVE_DEPTH,
};
use tessera_manifest::{check_signature, validate_manifest, SignatureStatus};
use tracing::{debug, info};

/// Per-call resolution policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Longest allowed path from the root
    pub max_depth: usize,
    /// Check the signature of every resolved manifest
    pub verify_signatures: bool,
    /// Whether unsigned manifests pass the signature check
    pub unsigned_policy: UnsignedPolicy,
    /// Fail with `missing_requirements` instead of reporting `missing`
    pub strict_interfaces: bool,
    /// Records the caller already has; never planned for install
    pub installed: Vec<PackageRef>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_RESOLVE_DEPTH,
            verify_signatures: true,
            unsigned_policy: UnsignedPolicy::Reject,
            strict_interfaces: false,
            installed: Vec::new(),
        }
    }
}

impl ResolveOptions {
    /// Options carrying the configured policies
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            max_depth: config.max_resolve_depth,
            verify_signatures: config.verify_signatures_on_resolve,
            unsigned_policy: config.unsigned_policy,
            strict_interfaces: config.strict_interfaces,
            installed: Vec::new(),
        }
    }

    /// Override the dependency depth bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Prefer these already-installed versions during selection
    pub fn with_installed(mut self, installed: Vec<PackageRef>) -> Self {
        self.installed = installed;
        self
    }

    /// Skip signature checks entirely
    pub fn without_signatures(mut self) -> Self {
        self.verify_signatures = false;
        self
    }

    /// Treat unsatisfied interface requirements as an error
    pub fn strict(mut self) -> Self {
        self.strict_interfaces = true;
        self
    }
}

/// Successful resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveOutcome {
    /// Install steps, dependencies first
    pub plan: Vec<PlanEntry>,
    /// Required interfaces the resolved set provides
    pub satisfies: Vec<InterfaceRef>,
    /// Required interfaces nobody provides
    pub missing: Vec<InterfaceRef>,
    /// Every resolved node with its depth
    #[serde(skip)]
    pub nodes: Vec<ResolutionNode>,
}

/// Resolve `root` against `catalog`
pub fn resolve(
    root: &PackageRef,
    catalog: &Catalog,
    options: &ResolveOptions,
) -> Result<ResolveOutcome> {
    let root_manifest = catalog
        .get_ref(root)
        .ok_or_else(|| RegistryError::package_not_found(root.clone()))?;
    admit(root_manifest, options)?;

    let resolver = DependencyGraphResolver::new(catalog, options.max_depth)
        .with_installed(options.installed.iter().cloned())?;
    let resolution = resolver.resolve(root)?;

    for manifest in &resolution.manifests {
        if manifest.package_ref() != *root {
            admit(manifest, options)?;
        }
    }

    let report = interfaces::check(resolution.manifests.iter().copied());
    if options.strict_interfaces && !report.is_satisfied() {
        return Err(RegistryError::MissingRequirements {
            missing: report.missing,
        });
    }

    info!(
        root = %root,
        planned = resolution.plan.len(),
        resolved = resolution.nodes.len(),
        missing = report.missing.len(),
        "resolution complete"
    );
    Ok(ResolveOutcome {
        plan: resolution.plan,
        satisfies: report.satisfies,
        missing: report.missing,
        nodes: resolution.nodes,
    })
}

/// Structural re-validation plus the optional signature gate
fn admit(manifest: &Manifest, options: &ResolveOptions) -> Result<()> {
    validate_manifest(manifest)?;
    if options.verify_signatures {
        let status = check_signature(manifest, options.unsigned_policy)?;
        if status == SignatureStatus::Unsigned {
            debug!(id = %manifest.package_ref(), "unsigned manifest accepted by policy");
        }
    }
    Ok(())
}
