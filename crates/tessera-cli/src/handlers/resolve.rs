//! Resolution over a local catalog

use crate::io::load_catalog;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tessera_core::{PackageRef, RegistryConfig, UnsignedPolicy};
use tessera_resolve::{resolve, ResolveOptions};

/// Command-line overrides on top of the configured policy
#[derive(Debug, Clone, Default)]
pub struct ResolveArgs {
    /// `id@version` to resolve
    pub root: String,
    /// `id@version` entries already installed
    pub installed: Vec<String>,
    /// Override of the configured depth bound
    pub max_depth: Option<usize>,
    /// Accept unsigned manifests
    pub allow_unsigned: bool,
    /// Skip signature checks
    pub skip_signatures: bool,
    /// Fail when a required interface is missing
    pub strict: bool,
}

/// Resolve `args.root` against the catalog at `catalog`, printing the plan as JSON
pub fn resolve_catalog(catalog: &Path, args: &ResolveArgs, config: &RegistryConfig) -> Result<String> {
    let catalog = load_catalog(catalog)?;
    let root = parse_ref(&args.root)?;
    let installed = args
        .installed
        .iter()
        .map(|text| parse_ref(text.as_str()))
        .collect::<Result<Vec<_>>>()?;

    let mut options = ResolveOptions::from_config(config).with_installed(installed);
    if let Some(max_depth) = args.max_depth {
        options = options.with_max_depth(max_depth);
    }
    if args.allow_unsigned {
        options.unsigned_policy = UnsignedPolicy::Accept;
    }
    if args.skip_signatures {
        options = options.without_signatures();
    }
    if args.strict {
        options = options.strict();
    }

    let outcome = resolve(&root, &catalog, &options)
        .with_context(|| format!("unable to resolve {root}"))?;
    Ok(serde_json::to_string_pretty(&outcome)?)
}

fn parse_ref(text: &str) -> Result<PackageRef> {
    text.parse()
        .map_err(|e| anyhow!("invalid package reference '{text}': {e}"))
}
