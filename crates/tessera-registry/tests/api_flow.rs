//! Registry API Flow
//!
//! Publish through the submission handler, then resolve against a snapshot
//! of the store, checking the status code and error code of every outcome.

#![allow(clippy::unwrap_used)]

use serde_json::{json, Value};
use tessera_core::{RegistryConfig, UnsignedPolicy};
use tessera_registry::{handle_resolve, handle_submit, InMemoryStore, ManifestStore, SubmitOptions};
use tessera_resolve::ResolveOptions;
use tessera_testkit::{manifest, KeyFixture, ManifestBuilder};

struct Registry {
    store: InMemoryStore,
    submit: SubmitOptions,
    resolve: ResolveOptions,
}

impl Registry {
    fn new(config: &RegistryConfig) -> Self {
        Self {
            store: InMemoryStore::new(),
            submit: SubmitOptions::from_config(config),
            resolve: ResolveOptions::from_config(config),
        }
    }

    fn publish(&self, builder: ManifestBuilder) -> (u16, Value) {
        let response = handle_submit(&builder.build_value(), &self.store, &self.submit);
        (response.status, response.body)
    }

    fn resolve(&self, body: Value) -> (u16, Value) {
        let response = handle_resolve(&body, &self.store.snapshot(), &self.resolve);
        (response.status, response.body)
    }
}

fn root(id: &str, version: &str) -> Value {
    json!({"root": {"id": id, "version": version}})
}

#[test]
fn publish_then_resolve_signed_catalog() {
    let registry = Registry::new(&RegistryConfig::default());
    let key = KeyFixture::from_seed(42);

    let (status, receipt) = registry.publish(
        manifest("com.example.app", "1.0.0")
            .depends_on("com.example.lib", "^1.0.0")
            .requires("kv.store@1")
            .signed_with(&key),
    );
    assert_eq!(status, 201);
    assert_eq!(receipt["id"], "com.example.app");
    assert_eq!(
        receipt["canonical_uri"],
        "https://registry.local/manifests/com.example.app/1.0.0"
    );
    assert!(receipt["canonical_digest"].as_str().unwrap().starts_with("sha256:"));

    for version in ["1.0.0", "1.2.0"] {
        let (status, _) = registry.publish(
            manifest("com.example.lib", version)
                .provides("kv.store@1")
                .signed_with(&key),
        );
        assert_eq!(status, 201);
    }

    let (status, body) = registry.resolve(root("com.example.app", "1.0.0"));
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "plan": [
                {"action": "install", "id": "com.example.lib", "version": "1.2.0"},
                {"action": "install", "id": "com.example.app", "version": "1.0.0"}
            ],
            "satisfies": ["kv.store@1"],
            "missing": []
        })
    );
}

#[test]
fn duplicate_submission_conflicts() {
    let registry = Registry::new(&RegistryConfig::default());
    let key = KeyFixture::from_seed(1);
    let (first, _) = registry.publish(manifest("com.example.app", "1.0.0").signed_with(&key));
    let (second, body) = registry.publish(manifest("com.example.app", "1.0.0").signed_with(&key));
    assert_eq!(first, 201);
    assert_eq!(second, 409);
    assert_eq!(body["error"], "already_exists");
    assert_eq!(body["details"]["package"]["id"], "com.example.app");
}

#[test]
fn validation_failures_map_to_400_codes() {
    let registry = Registry::new(&RegistryConfig::default());
    let valid = manifest("com.example.app", "1.0.0").build_value();

    let mut unknown = valid.clone();
    unknown["homepage"] = json!("https://example.com");
    let mut bad_digest = valid.clone();
    bad_digest["artifact"]["digest"] = json!("md5:abc");
    let mut bad_uri = valid.clone();
    bad_uri["artifact"]["uri"] = json!("ftp://mirror/app.wasm");
    let mut bad_id = valid;
    bad_id["id"] = json!("NotReverseDomain");

    for (body, code) in [
        (unknown, "invalid_schema"),
        (bad_digest, "invalid_digest"),
        (bad_uri, "invalid_uri"),
        (bad_id, "invalid_schema"),
    ] {
        let response = handle_submit(&body, &registry.store, &registry.submit);
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], code);
        assert!(!response.body["details"]["issues"].as_array().unwrap().is_empty());
    }
    assert!(registry.store.is_empty());
}

#[test]
fn tampered_signature_is_rejected_on_submit() {
    let registry = Registry::new(&RegistryConfig::default());
    let mut body = manifest("com.example.app", "1.0.0")
        .signed_with(&KeyFixture::from_seed(3))
        .build_value();
    body["chains"] = json!(["eip155:1", "eip155:137"]);

    let response = handle_submit(&body, &registry.store, &registry.submit);
    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"], "invalid_signature");
}

#[test]
fn resolve_failures_map_to_404_and_422() {
    let config = RegistryConfig {
        unsigned_policy: UnsignedPolicy::Accept,
        max_resolve_depth: 1,
        ..RegistryConfig::default()
    };
    let registry = Registry::new(&config);
    registry.publish(manifest("com.example.a", "1.0.0").depends_on("com.example.b", "^1.0.0"));
    registry.publish(manifest("com.example.b", "1.0.0").depends_on("com.example.a", "^1.0.0"));
    registry.publish(manifest("com.example.deep", "1.0.0").depends_on("com.example.mid", "^1.0.0"));
    registry.publish(manifest("com.example.mid", "1.0.0").depends_on("com.example.leaf", "^1.0.0"));
    registry.publish(manifest("com.example.leaf", "1.0.0"));

    let (status, body) = registry.resolve(root("com.example.ghost", "1.0.0"));
    assert_eq!(status, 404);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"]["kind"], "package");

    let (status, body) = registry.resolve(root("com.example.a", "1.0.0"));
    assert_eq!(status, 422);
    assert_eq!(body["error"], "dependency_conflict");
    assert_eq!(body["details"]["kind"], "cycle");

    let (status, body) = registry.resolve(root("com.example.deep", "1.0.0"));
    assert_eq!(status, 422);
    assert_eq!(body["error"], "resolve_depth_exceeded");
    assert_eq!(body["details"]["max_depth"], 1);
}

#[test]
fn strict_interfaces_reject_with_422() {
    let config = RegistryConfig {
        unsigned_policy: UnsignedPolicy::Accept,
        strict_interfaces: true,
        ..RegistryConfig::default()
    };
    let registry = Registry::new(&config);
    registry.publish(manifest("com.example.app", "1.0.0").requires("kv.store@1"));

    let (status, body) = registry.resolve(root("com.example.app", "1.0.0"));
    assert_eq!(status, 422);
    assert_eq!(body["error"], "missing_requirements");
    assert_eq!(body["details"]["missing"], json!(["kv.store@1"]));
}

#[test]
fn snapshot_reflects_store_contents() {
    let config = RegistryConfig {
        unsigned_policy: UnsignedPolicy::Accept,
        ..RegistryConfig::default()
    };
    let registry = Registry::new(&config);
    registry.publish(manifest("com.example.app", "1.0.0"));
    assert!(registry
        .store
        .get(&"com.example.app@1.0.0".parse().unwrap())
        .is_some());
    assert_eq!(registry.store.snapshot().len(), 1);
}
