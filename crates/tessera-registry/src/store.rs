//! Manifest storage
//!
//! Published records are immutable, so the only write is an atomic
//! insert-if-absent on `(id, version)`. Resolution never reads the store
//! directly; it works on a [`Catalog`] snapshot.

use parking_lot::RwLock;
use tessera_core::{Catalog, Manifest, PackageRef, Result};

/// Storage for published manifests
pub trait ManifestStore: Send + Sync {
    /// Register `manifest`, failing with `already_exists` if its
    /// `(id, version)` is taken. Check and insert happen atomically.
    fn insert_if_absent(&self, manifest: Manifest) -> Result<()>;

    /// Exact lookup
    fn get(&self, package: &PackageRef) -> Option<Manifest>;

    /// Immutable view of everything published so far
    fn snapshot(&self) -> Catalog;
}

/// Process-local store backed by a catalog behind a lock
#[derive(Debug, Default)]
pub struct InMemoryStore {
    catalog: RwLock<Catalog>,
}

impl InMemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing catalog
    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.catalog.read().len()
    }

    /// Whether nothing has been stored yet
    pub fn is_empty(&self) -> bool {
        self.catalog.read().is_empty()
    }
}

impl ManifestStore for InMemoryStore {
    fn insert_if_absent(&self, manifest: Manifest) -> Result<()> {
        // Write guard spans the duplicate check inside Catalog::insert
        self.catalog.write().insert(manifest)
    }

    fn get(&self, package: &PackageRef) -> Option<Manifest> {
        self.catalog.read().get_ref(package).cloned()
    }

    fn snapshot(&self) -> Catalog {
        self.catalog.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_testkit::{manifest, pkg};

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = InMemoryStore::new();
        store
            .insert_if_absent(manifest("com.example.app", "1.0.0").build())
            .unwrap();
        let err = store
            .insert_if_absent(manifest("com.example.app", "1.0.0").target("other").build())
            .unwrap_err();
        assert_eq!(err.code(), "already_exists");
        assert_eq!(
            store.get(&pkg("com.example.app@1.0.0")).unwrap().artifact.target,
            "wasm32-wasi"
        );
    }

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let store = InMemoryStore::new();
        store
            .insert_if_absent(manifest("com.example.app", "1.0.0").build())
            .unwrap();
        let snapshot = store.snapshot();
        store
            .insert_if_absent(manifest("com.example.app", "1.1.0").build())
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_duplicates_admit_exactly_one() {
        let store = Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .insert_if_absent(manifest("com.example.app", "1.0.0").build())
                        .is_ok()
                })
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(store.len(), 1);
    }
}
