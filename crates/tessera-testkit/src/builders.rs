//! Manifest and catalog builders
//!
//! Fixtures only need an id and a version; everything else defaults to a
//! valid value so tests state just the fields they care about.

use crate::keys::KeyFixture;
use sha2::{Digest, Sha256};
use tessera_core::{
    Artifact, ArtifactUri, Catalog, ChainId, ContentDigest, Dependency, InterfaceRef, Manifest,
    PackageId, PackageRef, Version, VersionRange,
};

/// Parse `id@version`
///
/// # Example
/// ```rust
/// let root = tessera_testkit::pkg("com.example.app@1.0.0");
/// assert_eq!(root.version.major, 1);
/// ```
pub fn pkg(text: &str) -> PackageRef {
    text.parse().expect("fixture package reference")
}

/// Shorthand for [`ManifestBuilder::new`]
pub fn manifest(id: &str, version: &str) -> ManifestBuilder {
    ManifestBuilder::new(id, version)
}

/// Builder for valid manifests
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    id: PackageId,
    version: Version,
    chains: Vec<ChainId>,
    target: String,
    provides: Vec<InterfaceRef>,
    requires: Vec<InterfaceRef>,
    dependencies: Vec<Dependency>,
    signer: Option<KeyFixture>,
}

impl ManifestBuilder {
    pub fn new(id: &str, version: &str) -> Self {
        Self {
            id: id.parse().expect("fixture package id"),
            version: Version::parse(version).expect("fixture version"),
            chains: vec!["eip155:1".parse().expect("fixture chain")],
            target: "wasm32-wasi".to_string(),
            provides: Vec::new(),
            requires: Vec::new(),
            dependencies: Vec::new(),
            signer: None,
        }
    }

    /// Add a dependency edge with a semver range
    pub fn depends_on(mut self, id: &str, range: &str) -> Self {
        self.dependencies.push(Dependency {
            id: id.parse().expect("fixture dependency id"),
            range: VersionRange::parse(range).expect("fixture range"),
        });
        self
    }

    pub fn provides(mut self, interface: &str) -> Self {
        self.provides
            .push(interface.parse().expect("fixture interface"));
        self
    }

    pub fn requires(mut self, interface: &str) -> Self {
        self.requires
            .push(interface.parse().expect("fixture interface"));
        self
    }

    /// Add a chain; the default `eip155:1` stays in place
    pub fn chain(mut self, chain: &str) -> Self {
        self.chains.push(chain.parse().expect("fixture chain"));
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Sign the built manifest with `key`
    pub fn signed_with(mut self, key: &KeyFixture) -> Self {
        self.signer = Some(key.clone());
        self
    }

    pub fn build(self) -> Manifest {
        let digest = Sha256::digest(format!("{}@{}", self.id, self.version).as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        let uri: ArtifactUri = format!("https://artifacts.example/{}/{}.wasm", self.id, self.version)
            .parse()
            .expect("fixture uri");

        let manifest = Manifest {
            id: self.id,
            version: self.version,
            chains: self.chains,
            artifact: Artifact {
                kind: "wasm".to_string(),
                target: self.target,
                digest: ContentDigest::from_sha256(&bytes),
                uri,
            },
            provides: self.provides,
            requires: self.requires,
            dependencies: self.dependencies,
            signature: None,
        };
        match &self.signer {
            Some(key) => key.sign(&manifest),
            None => manifest,
        }
    }

    /// Wire form of the built manifest
    pub fn build_value(self) -> serde_json::Value {
        self.build().to_value().expect("fixture manifest serializes")
    }
}

/// Builder for catalog snapshots
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    manifests: Vec<Manifest>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, builder: ManifestBuilder) -> Self {
        self.manifests.push(builder.build());
        self
    }

    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifests.push(manifest);
        self
    }

    /// Sign every manifest added so far with `key`
    pub fn signed_with(mut self, key: &KeyFixture) -> Self {
        self.manifests = self.manifests.iter().map(|m| key.sign(m)).collect();
        self
    }

    pub fn build(self) -> Catalog {
        Catalog::from_manifests(self.manifests).expect("fixture catalog has no duplicates")
    }
}
