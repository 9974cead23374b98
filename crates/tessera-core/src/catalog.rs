//! Catalog snapshot
//!
//! An immutable, in-memory view of every published manifest, indexed by
//! package id and then by version. The store builds one and hands it to
//! resolution by shared reference; nothing in resolution mutates it.

use crate::errors::{RegistryError, Result};
use crate::identifiers::{PackageId, PackageRef};
use crate::manifest::{Manifest, VersionRange};
use semver::Version;
use std::collections::BTreeMap;

/// Manifests indexed by `id`, then by ascending version
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: BTreeMap<PackageId, BTreeMap<Version, Manifest>>,
}

impl Catalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate `(id, version)` pairs
    pub fn from_manifests<I>(manifests: I) -> Result<Self>
    where
        I: IntoIterator<Item = Manifest>,
    {
        let mut catalog = Self::new();
        for manifest in manifests {
            catalog.insert(manifest)?;
        }
        Ok(catalog)
    }

    /// Add a manifest while assembling a snapshot
    pub fn insert(&mut self, manifest: Manifest) -> Result<()> {
        let versions = self.packages.entry(manifest.id.clone()).or_default();
        if versions.contains_key(&manifest.version) {
            return Err(RegistryError::AlreadyExists {
                package: manifest.package_ref(),
            });
        }
        versions.insert(manifest.version.clone(), manifest);
        Ok(())
    }

    /// Exact lookup
    pub fn get(&self, id: &PackageId, version: &Version) -> Option<&Manifest> {
        self.packages.get(id).and_then(|versions| versions.get(version))
    }

    /// Exact lookup by reference
    pub fn get_ref(&self, package: &PackageRef) -> Option<&Manifest> {
        self.get(&package.id, &package.version)
    }

    /// Published versions of `id`, ascending
    pub fn versions<'a>(&'a self, id: &PackageId) -> impl Iterator<Item = &'a Version> + 'a {
        self.packages
            .get(id)
            .into_iter()
            .flat_map(|versions| versions.keys())
    }

    /// Highest published version of `id` inside `range`
    pub fn select_highest(&self, id: &PackageId, range: &VersionRange) -> Option<&Manifest> {
        self.packages.get(id).and_then(|versions| {
            versions
                .iter()
                .rev()
                .find(|(version, _)| range.matches(version))
                .map(|(_, manifest)| manifest)
        })
    }

    /// Every manifest, ordered by id then version
    pub fn iter(&self) -> impl Iterator<Item = &Manifest> {
        self.packages.values().flat_map(|versions| versions.values())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.packages.values().map(BTreeMap::len).sum()
    }

    /// Whether the catalog holds no records
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
