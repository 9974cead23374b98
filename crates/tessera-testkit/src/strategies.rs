//! Property test strategies for Tessera types
//!
//! Identifier strategies only produce values that pass the schema patterns.
//! [`arb_layered_catalog`] produces dependency DAGs that are acyclic by
//! construction, so properties over successful resolutions can be checked
//! without filtering.

use crate::builders::{pkg, ManifestBuilder};
use proptest::prelude::*;
use tessera_core::{Catalog, InterfaceRef, Manifest, PackageId, PackageRef};

// Re-export proptest for convenience
pub use proptest;

/// Reverse-domain package ids such as `com.ab.c-d`
pub fn arb_package_id() -> impl Strategy<Value = PackageId> {
    ("[a-z]{2,6}", "[a-z0-9]{1,8}", "[a-z0-9-]{1,8}")
        .prop_map(|(tld, org, name)| format!("{tld}.{org}.{name}").parse().unwrap())
}

/// `name@major` interface references
pub fn arb_interface_ref() -> impl Strategy<Value = InterfaceRef> {
    ("[a-z]{1,6}(\\.[a-z]{1,6})?", 0u64..5)
        .prop_map(|(name, major)| format!("{name}@{major}").parse().unwrap())
}

/// Acyclic catalog with its generating edge list
#[derive(Debug, Clone)]
pub struct LayeredCatalog {
    /// Every published manifest
    pub manifests: Vec<Manifest>,
    /// Dependency edges as `(from, to)` package indices, always `from < to`
    pub edges: Vec<(usize, usize)>,
    /// Number of distinct packages
    pub packages: usize,
    /// Published minor versions per package, all under major 1
    pub versions: Vec<u64>,
}

impl LayeredCatalog {
    pub fn package_id(index: usize) -> String {
        format!("org.layer.p{index}")
    }

    /// Highest published version of package `index`
    pub fn highest(&self, index: usize) -> PackageRef {
        pkg(&format!(
            "{}@1.{}.0",
            Self::package_id(index),
            self.versions[index] - 1
        ))
    }

    /// The highest version of package 0
    pub fn root(&self) -> PackageRef {
        self.highest(0)
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::from_manifests(self.manifests.clone()).unwrap()
    }

    /// Longest edge path starting at package `index`
    pub fn longest_path_from(&self, index: usize) -> usize {
        let mut depth = vec![0usize; self.packages];
        for from in (0..self.packages).rev() {
            depth[from] = self
                .edges
                .iter()
                .filter(|(f, _)| *f == from)
                .map(|(_, to)| depth[*to] + 1)
                .max()
                .unwrap_or(0);
        }
        depth[index]
    }
}

/// Random dependency DAG of `2..=max_packages` packages.
///
/// Edges only point from a lower to a higher package index and use the
/// range `^1.0.0`, which every published version satisfies, so resolution
/// always selects the highest version of each reachable package.
pub fn arb_layered_catalog(max_packages: usize) -> impl Strategy<Value = LayeredCatalog> {
    (2..=max_packages.max(2))
        .prop_flat_map(|packages| {
            let pairs = packages * (packages - 1) / 2;
            (
                Just(packages),
                prop::collection::vec(1u64..4, packages),
                prop::collection::vec(prop::bool::weighted(0.35), pairs),
            )
        })
        .prop_map(|(packages, versions, mask)| {
            let mut edges = Vec::new();
            let mut bit = mask.into_iter();
            for from in 0..packages {
                for to in (from + 1)..packages {
                    if bit.next().unwrap_or(false) {
                        edges.push((from, to));
                    }
                }
            }

            let mut manifests = Vec::new();
            for (index, count) in versions.iter().enumerate() {
                for minor in 0..*count {
                    let mut builder = ManifestBuilder::new(
                        &LayeredCatalog::package_id(index),
                        &format!("1.{minor}.0"),
                    );
                    for (_, to) in edges.iter().filter(|(f, _)| *f == index) {
                        builder = builder.depends_on(&LayeredCatalog::package_id(*to), "^1.0.0");
                    }
                    manifests.push(builder.build());
                }
            }
            LayeredCatalog {
                manifests,
                edges,
                packages,
                versions,
            }
        })
}
