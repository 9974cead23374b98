//! Dependency graph resolution
//!
//! Depth-first walk over the catalog from a root record. Each node is keyed by
//! `id@version` and colored gray while it is on the walk path and black once
//! all of its dependencies are done; reaching a gray node again is a cycle.
//!
//! The walk keeps an explicit stack of frames instead of recursing, so the
//! depth bound is the only limit on graph depth. After a clean walk the
//! longest-path depth of every node is computed over the discovered DAG in
//! topological order: a node shared by paths of different length records the
//! longest one.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tessera_core::{
    Catalog, ConflictKind, Dependency, Manifest, Missing, PackageId, PackageRef, RegistryError,
    Result, UnresolvedDependency, Version,
};
use tracing::debug;

/// What to do with a planned package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    /// Fetch and install the artifact
    Install,
}

/// One step of an install plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Action to take
    pub action: PlanAction,
    /// Package identifier
    pub id: PackageId,
    /// Selected version
    pub version: Version,
}

impl PlanEntry {
    /// Install step for `package`
    pub fn install(package: &PackageRef) -> Self {
        Self {
            action: PlanAction::Install,
            id: package.id.clone(),
            version: package.version.clone(),
        }
    }

    /// The planned record
    pub fn package_ref(&self) -> PackageRef {
        PackageRef::new(self.id.clone(), self.version.clone())
    }
}

/// A resolved node with its longest-path depth from the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionNode {
    /// Package identifier
    pub id: PackageId,
    /// Selected version
    pub version: Version,
    /// Longest edge count from the root, root = 0
    pub depth: usize,
}

/// Successful walk over the catalog
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// Install steps, dependencies before dependents, installed packages omitted
    pub plan: Vec<PlanEntry>,
    /// Every resolved node in post-order, installed packages included
    pub nodes: Vec<ResolutionNode>,
    /// Manifests of every resolved node, in the same order as `nodes`
    pub manifests: Vec<&'a Manifest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

#[derive(Debug)]
struct Frame {
    node: PackageRef,
    next_dependency: usize,
    depth: usize,
}

/// Walks dependency edges of one catalog snapshot
#[derive(Debug, Clone)]
pub struct DependencyGraphResolver<'a> {
    catalog: &'a Catalog,
    max_depth: usize,
    installed: BTreeMap<PackageId, Version>,
}

impl<'a> DependencyGraphResolver<'a> {
    /// Resolver over `catalog` with the given depth bound
    pub fn new(catalog: &'a Catalog, max_depth: usize) -> Self {
        Self {
            catalog,
            max_depth,
            installed: BTreeMap::new(),
        }
    }

    /// Prefer already-installed versions when they satisfy an edge.
    ///
    /// Every installed record must be published in the catalog, and at most
    /// one version per id may be installed.
    pub fn with_installed<I>(mut self, installed: I) -> Result<Self>
    where
        I: IntoIterator<Item = PackageRef>,
    {
        for package in installed {
            if self.catalog.get_ref(&package).is_none() {
                return Err(RegistryError::package_not_found(package));
            }
            if let Some(existing) = self.installed.get(&package.id) {
                if existing != &package.version {
                    return Err(RegistryError::DependencyConflict {
                        conflict: ConflictKind::VersionClash {
                            id: package.id.clone(),
                            existing: existing.clone(),
                            requested: package.version.clone(),
                            requested_by: package,
                        },
                    });
                }
            }
            self.installed.insert(package.id, package.version);
        }
        Ok(self)
    }

    /// Resolve `root` into an install plan
    pub fn resolve(&self, root: &PackageRef) -> Result<Resolution<'a>> {
        if self.catalog.get_ref(root).is_none() {
            return Err(RegistryError::package_not_found(root.clone()));
        }

        let mut walk = Walk::new(root);
        let mut stack = vec![Frame {
            node: root.clone(),
            next_dependency: 0,
            depth: 0,
        }];
        debug!(id = %root, depth = 0, "visiting");

        while let Some(frame) = stack.last_mut() {
            let manifest = self.manifest(&frame.node)?;
            if let Some(dependency) = manifest.dependencies.get(frame.next_dependency) {
                frame.next_dependency += 1;
                let from = frame.node.clone();
                let depth = frame.depth + 1;
                if let Some(child) = self.follow_edge(&mut walk, from, dependency, depth)? {
                    stack.push(child);
                }
            } else if let Some(done) = stack.pop() {
                walk.colors.insert(done.node.clone(), Color::Black);
                walk.post_order.push(done.node);
            }
        }

        if !walk.unresolved.is_empty() {
            return Err(RegistryError::NotFound {
                missing: Missing::UnresolvedDependencies {
                    edges: walk.unresolved,
                },
            });
        }

        let depths = longest_path_depths(root, &walk.post_order, &walk.children);
        // First offender in topological order
        for node in walk.post_order.iter().rev() {
            let depth = depths.get(node).copied().unwrap_or_default();
            if depth > self.max_depth {
                return Err(RegistryError::ResolveDepthExceeded {
                    node: node.clone(),
                    depth,
                    max_depth: self.max_depth,
                });
            }
        }

        let mut plan = Vec::new();
        let mut nodes = Vec::with_capacity(walk.post_order.len());
        let mut manifests = Vec::with_capacity(walk.post_order.len());
        for node in &walk.post_order {
            if !self.is_installed(node) {
                plan.push(PlanEntry::install(node));
            }
            nodes.push(ResolutionNode {
                id: node.id.clone(),
                version: node.version.clone(),
                depth: depths.get(node).copied().unwrap_or_default(),
            });
            manifests.push(self.manifest(node)?);
        }

        Ok(Resolution {
            plan,
            nodes,
            manifests,
        })
    }

    /// Select a version for one edge and decide whether to descend into it
    fn follow_edge(
        &self,
        walk: &mut Walk,
        from: PackageRef,
        dependency: &Dependency,
        depth: usize,
    ) -> Result<Option<Frame>> {
        let Some(version) = self.select(dependency) else {
            debug!(from = %from, id = %dependency.id, range = %dependency.range, "no satisfying version");
            walk.unresolved.push(UnresolvedDependency {
                from,
                id: dependency.id.clone(),
                range: dependency.range.clone(),
            });
            return Ok(None);
        };

        if let Some(existing) = walk.selected.get(&dependency.id) {
            if existing != &version {
                return Err(RegistryError::DependencyConflict {
                    conflict: ConflictKind::VersionClash {
                        id: dependency.id.clone(),
                        existing: existing.clone(),
                        requested: version,
                        requested_by: from,
                    },
                });
            }
        } else {
            walk.selected.insert(dependency.id.clone(), version.clone());
        }

        let child = PackageRef::new(dependency.id.clone(), version);
        walk.children
            .entry(from.clone())
            .or_default()
            .push(child.clone());

        match walk.colors.get(&child).copied() {
            Some(Color::Gray) => Err(RegistryError::DependencyConflict {
                conflict: ConflictKind::Cycle { from, to: child },
            }),
            Some(Color::Black) => Ok(None),
            None => {
                if depth > self.max_depth {
                    return Err(RegistryError::ResolveDepthExceeded {
                        node: child,
                        depth,
                        max_depth: self.max_depth,
                    });
                }
                debug!(id = %child, depth, "visiting");
                walk.colors.insert(child.clone(), Color::Gray);
                Ok(Some(Frame {
                    node: child,
                    next_dependency: 0,
                    depth,
                }))
            }
        }
    }

    /// Installed version if it satisfies the range, else the highest match
    fn select(&self, dependency: &Dependency) -> Option<Version> {
        if let Some(installed) = self.installed.get(&dependency.id) {
            if dependency.range.matches(installed) {
                return Some(installed.clone());
            }
        }
        self.catalog
            .select_highest(&dependency.id, &dependency.range)
            .map(|manifest| manifest.version.clone())
    }

    fn is_installed(&self, node: &PackageRef) -> bool {
        self.installed.get(&node.id) == Some(&node.version)
    }

    fn manifest(&self, node: &PackageRef) -> Result<&'a Manifest> {
        self.catalog
            .get_ref(node)
            .ok_or_else(|| RegistryError::internal(format!("{node} vanished from the catalog")))
    }
}

/// Mutable state of one resolve call
#[derive(Debug, Default)]
struct Walk {
    colors: HashMap<PackageRef, Color>,
    selected: HashMap<PackageId, Version>,
    children: HashMap<PackageRef, Vec<PackageRef>>,
    post_order: Vec<PackageRef>,
    unresolved: Vec<UnresolvedDependency>,
}

impl Walk {
    fn new(root: &PackageRef) -> Self {
        let mut walk = Self::default();
        walk.colors.insert(root.clone(), Color::Gray);
        walk.selected
            .insert(root.id.clone(), root.version.clone());
        walk
    }
}

/// Longest edge count from `root` to every node of an acyclic walk.
///
/// Reverse post-order is a topological order, so each node's depth is final
/// before it is relaxed into its children.
fn longest_path_depths(
    root: &PackageRef,
    post_order: &[PackageRef],
    children: &HashMap<PackageRef, Vec<PackageRef>>,
) -> HashMap<PackageRef, usize> {
    let mut depths: HashMap<PackageRef, usize> = HashMap::with_capacity(post_order.len());
    depths.insert(root.clone(), 0);
    for node in post_order.iter().rev() {
        let depth = depths.get(node).copied().unwrap_or_default();
        for child in children.get(node).into_iter().flatten() {
            let entry = depths.entry(child.clone()).or_default();
            *entry = (*entry).max(depth + 1);
        }
    }
    depths
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tessera_testkit::{manifest, pkg, CatalogBuilder};

    #[test]
    fn leaf_root_plans_itself() {
        let catalog = CatalogBuilder::new()
            .with(manifest("com.example.app", "1.0.0"))
            .build();
        let resolution = DependencyGraphResolver::new(&catalog, 4)
            .resolve(&pkg("com.example.app@1.0.0"))
            .unwrap();
        assert_eq!(resolution.plan, vec![PlanEntry::install(&pkg("com.example.app@1.0.0"))]);
        assert_eq!(resolution.nodes[0].depth, 0);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let catalog = CatalogBuilder::new()
            .with(manifest("com.example.app", "1.0.0").depends_on("com.example.app", "=1.0.0"))
            .build();
        let err = DependencyGraphResolver::new(&catalog, 4)
            .resolve(&pkg("com.example.app@1.0.0"))
            .unwrap_err();
        assert_matches!(
            err,
            RegistryError::DependencyConflict { conflict: ConflictKind::Cycle { ref from, ref to } }
                if from == to
        );
    }

    #[test]
    fn shared_dependency_is_planned_once() {
        let catalog = CatalogBuilder::new()
            .with(
                manifest("com.example.app", "1.0.0")
                    .depends_on("com.example.a", "^1")
                    .depends_on("com.example.b", "^1"),
            )
            .with(manifest("com.example.a", "1.0.0").depends_on("com.example.base", "^1"))
            .with(manifest("com.example.b", "1.0.0").depends_on("com.example.base", "^1"))
            .with(manifest("com.example.base", "1.0.0"))
            .build();
        let resolution = DependencyGraphResolver::new(&catalog, 8)
            .resolve(&pkg("com.example.app@1.0.0"))
            .unwrap();
        let ids: Vec<_> = resolution.plan.iter().map(|e| e.id.to_string()).collect();
        assert_eq!(
            ids,
            ["com.example.base", "com.example.a", "com.example.b", "com.example.app"]
        );
    }

    #[test]
    fn installed_must_be_published() {
        let catalog = CatalogBuilder::new()
            .with(manifest("com.example.app", "1.0.0"))
            .build();
        let err = DependencyGraphResolver::new(&catalog, 4)
            .with_installed([pkg("com.example.lib@1.0.0")])
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn unsatisfied_installed_version_falls_back_to_catalog() {
        let catalog = CatalogBuilder::new()
            .with(manifest("com.example.app", "1.0.0").depends_on("com.example.lib", "^2.0.0"))
            .with(manifest("com.example.lib", "1.0.0"))
            .with(manifest("com.example.lib", "2.1.0"))
            .build();
        let resolution = DependencyGraphResolver::new(&catalog, 4)
            .with_installed([pkg("com.example.lib@1.0.0")])
            .unwrap()
            .resolve(&pkg("com.example.app@1.0.0"))
            .unwrap();
        assert_eq!(resolution.plan[0].package_ref(), pkg("com.example.lib@2.1.0"));
    }

    #[test]
    fn plan_entry_serializes_action() {
        let value = serde_json::to_value(PlanEntry::install(&pkg("com.example.lib@1.2.0"))).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"action": "install", "id": "com.example.lib", "version": "1.2.0"})
        );
    }
}
