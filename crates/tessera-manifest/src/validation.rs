//! Manifest schema validation
//!
//! A pure structural gate over the raw JSON document. It runs before any
//! canonicalization or signature work and never performs I/O. The schema is
//! closed: unknown fields are errors at every level, so a field cannot be
//! signed under one interpretation and stored under another.
//!
//! The validator reports every issue it finds rather than stopping at the
//! first one.

use serde_json::{Map, Value};
use tessera_core::identifiers::patterns;
use tessera_core::{IssueKind, Manifest, RegistryError, Result, ValidationIssue};

/// Fields every manifest must carry
pub const REQUIRED_FIELDS: &[&str] = &["id", "version", "chains", "artifact"];

/// Fields a manifest may carry
pub const OPTIONAL_FIELDS: &[&str] = &["provides", "requires", "dependencies", "signature"];

/// Members of the `artifact` object, all required
pub const ARTIFACT_FIELDS: &[&str] = &["type", "target", "digest", "uri"];

/// Members of a dependency entry, all required
pub const DEPENDENCY_FIELDS: &[&str] = &["id", "range"];

/// Members of the signature block, all optional at the schema level
pub const SIGNATURE_FIELDS: &[&str] = &["alg", "pubkey", "sig", "signed_at"];

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// True when `errors` is empty
    pub valid: bool,
    /// Every issue found, in field order
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Convert into the error taxonomy
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(RegistryError::from_issues(self.errors))
        }
    }
}

/// Validate a raw manifest document
pub fn validate(raw: &Value) -> ValidationReport {
    let mut validator = ManifestValidator::default();
    validator.check_document(raw);
    validator.finish()
}

/// Validate and decode a raw manifest document
pub fn parse_manifest(raw: &Value) -> Result<Manifest> {
    validate(raw).into_result()?;
    Manifest::from_value(raw.clone())
}

/// Validate an already-typed manifest.
///
/// Typed manifests can only hold valid identifiers, but re-running the gate
/// over their serialized form keeps catalog records honest when they were
/// constructed by code rather than decoded.
pub fn validate_manifest(manifest: &Manifest) -> Result<()> {
    validate(&manifest.to_value()?).into_result()
}

/// Accumulates issues while walking a document
#[derive(Debug, Default)]
struct ManifestValidator {
    issues: Vec<ValidationIssue>,
}

impl ManifestValidator {
    fn finish(self) -> ValidationReport {
        ValidationReport {
            valid: self.issues.is_empty(),
            errors: self.issues,
        }
    }

    fn push(&mut self, field: impl Into<String>, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            field: field.into(),
            kind,
            message: message.into(),
        });
    }

    fn schema(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(field, IssueKind::Schema, message);
    }

    fn check_document(&mut self, raw: &Value) {
        let Some(doc) = raw.as_object() else {
            self.schema("$", "manifest must be a JSON object");
            return;
        };

        let allowed: Vec<&str> = REQUIRED_FIELDS.iter().chain(OPTIONAL_FIELDS).copied().collect();
        self.check_closed("", doc, &allowed);
        self.check_required("", doc, REQUIRED_FIELDS);

        if let Some(id) = doc.get("id") {
            self.check_package_id("id", id);
        }
        if let Some(version) = doc.get("version") {
            self.check_version("version", version);
        }
        if let Some(chains) = doc.get("chains") {
            self.check_chains(chains);
        }
        if let Some(artifact) = doc.get("artifact") {
            self.check_artifact(artifact);
        }
        for list in ["provides", "requires"] {
            if let Some(value) = doc.get(list) {
                self.check_interfaces(list, value);
            }
        }
        if let Some(dependencies) = doc.get("dependencies") {
            self.check_dependencies(dependencies);
        }
        if let Some(signature) = doc.get("signature") {
            self.check_signature(signature);
        }
    }

    fn check_closed(&mut self, prefix: &str, object: &Map<String, Value>, allowed: &[&str]) {
        for key in object.keys() {
            if !allowed.contains(&key.as_str()) {
                self.schema(join(prefix, key), "unknown field");
            }
        }
    }

    fn check_required(&mut self, prefix: &str, object: &Map<String, Value>, required: &[&str]) {
        for field in required {
            if !object.contains_key(*field) {
                self.schema(join(prefix, field), "required field is missing");
            }
        }
    }

    fn string<'a>(&mut self, field: &str, value: &'a Value) -> Option<&'a str> {
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                self.schema(field, "must be a string");
                None
            }
        }
    }

    fn array<'a>(&mut self, field: &str, value: &'a Value) -> Option<&'a Vec<Value>> {
        match value.as_array() {
            Some(items) => Some(items),
            None => {
                self.schema(field, "must be an array");
                None
            }
        }
    }

    fn object<'a>(&mut self, field: &str, value: &'a Value) -> Option<&'a Map<String, Value>> {
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                self.schema(field, "must be an object");
                None
            }
        }
    }

    fn check_package_id(&mut self, field: &str, value: &Value) {
        if let Some(id) = self.string(field, value) {
            if !patterns::is_package_id(id) {
                self.schema(
                    field,
                    format!("'{id}' is not a reverse-domain id ({})", patterns::PACKAGE_ID),
                );
            }
        }
    }

    fn check_version(&mut self, field: &str, value: &Value) {
        if let Some(version) = self.string(field, value) {
            if let Err(e) = semver::Version::parse(version) {
                self.schema(field, format!("'{version}' is not a semantic version: {e}"));
            }
        }
    }

    fn check_chains(&mut self, value: &Value) {
        let Some(chains) = self.array("chains", value) else {
            return;
        };
        for (i, chain) in chains.iter().enumerate() {
            let field = format!("chains[{i}]");
            if let Some(chain) = self.string(&field, chain) {
                if !patterns::is_chain_id(chain) {
                    self.schema(field, "chain id must be non-empty and contain no whitespace");
                }
            }
        }
    }

    fn check_artifact(&mut self, value: &Value) {
        let Some(artifact) = self.object("artifact", value) else {
            return;
        };
        self.check_closed("artifact", artifact, ARTIFACT_FIELDS);
        self.check_required("artifact", artifact, ARTIFACT_FIELDS);

        for field in ["type", "target"] {
            if let Some(value) = artifact.get(field) {
                let path = join("artifact", field);
                if let Some(text) = self.string(&path, value) {
                    if text.trim().is_empty() {
                        self.schema(path, "must not be empty");
                    }
                }
            }
        }
        if let Some(digest) = artifact.get("digest") {
            match digest.as_str() {
                Some(d) if patterns::is_sha256_digest(d) => {}
                Some(d) => self.push(
                    "artifact.digest",
                    IssueKind::Digest,
                    format!("'{d}' does not match {}", patterns::SHA256_DIGEST),
                ),
                None => self.push("artifact.digest", IssueKind::Digest, "must be a string"),
            }
        }
        if let Some(uri) = artifact.get("uri") {
            match uri.as_str() {
                Some(u) if patterns::is_artifact_uri(u) => {}
                Some(u) => self.push(
                    "artifact.uri",
                    IssueKind::Uri,
                    format!(
                        "'{u}' must start with one of {}",
                        patterns::ARTIFACT_URI_SCHEMES.join(", ")
                    ),
                ),
                None => self.push("artifact.uri", IssueKind::Uri, "must be a string"),
            }
        }
    }

    fn check_interfaces(&mut self, list: &str, value: &Value) {
        let Some(items) = self.array(list, value) else {
            return;
        };
        for (i, item) in items.iter().enumerate() {
            let field = format!("{list}[{i}]");
            if let Some(iface) = self.string(&field, item) {
                if !patterns::is_interface_ref(iface) {
                    self.schema(
                        field,
                        format!("'{iface}' is not an interface reference ({})", patterns::INTERFACE_REF),
                    );
                }
            }
        }
    }

    fn check_dependencies(&mut self, value: &Value) {
        let Some(items) = self.array("dependencies", value) else {
            return;
        };
        for (i, item) in items.iter().enumerate() {
            let prefix = format!("dependencies[{i}]");
            let Some(dep) = self.object(&prefix, item) else {
                continue;
            };
            self.check_closed(&prefix, dep, DEPENDENCY_FIELDS);
            self.check_required(&prefix, dep, DEPENDENCY_FIELDS);
            if let Some(id) = dep.get("id") {
                self.check_package_id(&join(&prefix, "id"), id);
            }
            if let Some(range) = dep.get("range") {
                let field = join(&prefix, "range");
                if let Some(text) = self.string(&field, range) {
                    if let Err(e) = semver::VersionReq::parse(text) {
                        self.schema(field, format!("'{text}' is not a version range: {e}"));
                    }
                }
            }
        }
    }

    fn check_signature(&mut self, value: &Value) {
        let Some(block) = self.object("signature", value) else {
            return;
        };
        self.check_closed("signature", block, SIGNATURE_FIELDS);
        for (key, member) in block {
            if SIGNATURE_FIELDS.contains(&key.as_str()) {
                self.string(&join("signature", key), member);
            }
        }
    }
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_document() -> Value {
        json!({
            "id": "com.example.app",
            "version": "1.0.0",
            "chains": ["eip155:1"],
            "artifact": {
                "type": "wasm",
                "target": "wasm32-wasi",
                "digest": format!("sha256:{}", "a".repeat(64)),
                "uri": "https://cdn.example/app.wasm"
            },
            "provides": ["app.ui@1"],
            "requires": ["kv.store@1"],
            "dependencies": [{"id": "com.example.kv", "range": "^1.0.0"}]
        })
    }

    fn fields(report: &ValidationReport) -> Vec<&str> {
        report.errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn accepts_well_formed_manifest() {
        let report = validate(&valid_document());
        assert!(report.valid, "{:?}", report.errors);
        assert!(parse_manifest(&valid_document()).is_ok());
    }

    #[test]
    fn rejects_unknown_top_level_field() {
        let mut doc = valid_document();
        doc["homepage"] = json!("https://example.com");
        let report = validate(&doc);
        assert!(!report.valid);
        assert_eq!(fields(&report), vec!["homepage"]);
        assert_eq!(report.errors[0].message, "unknown field");
    }

    #[test]
    fn reports_every_missing_required_field() {
        let report = validate(&json!({"id": "com.example.app"}));
        assert_eq!(fields(&report), vec!["version", "chains", "artifact"]);
    }

    #[test]
    fn id_must_be_reverse_domain() {
        let mut doc = valid_document();
        doc["id"] = json!("MyApp");
        let report = validate(&doc);
        assert_eq!(fields(&report), vec!["id"]);
    }

    #[test]
    fn version_must_be_semver() {
        let mut doc = valid_document();
        doc["version"] = json!("1.0");
        assert_eq!(fields(&validate(&doc)), vec!["version"]);
    }

    #[test]
    fn digest_issue_maps_to_invalid_digest() {
        let mut doc = valid_document();
        doc["artifact"]["digest"] = json!("md5:abc");
        let err = validate(&doc).into_result().unwrap_err();
        assert_eq!(err.code(), "invalid_digest");
    }

    #[test]
    fn uri_issue_maps_to_invalid_uri() {
        let mut doc = valid_document();
        doc["artifact"]["uri"] = json!("ftp://mirror.example/app.wasm");
        let err = validate(&doc).into_result().unwrap_err();
        assert_eq!(err.code(), "invalid_uri");
    }

    #[test]
    fn interface_refs_need_integer_major() {
        let mut doc = valid_document();
        doc["requires"] = json!(["kv.store@1", "kv.store@latest", "KV@1"]);
        assert_eq!(fields(&validate(&doc)), vec!["requires[1]", "requires[2]"]);
    }

    #[test]
    fn dependency_entries_are_closed_and_checked() {
        let mut doc = valid_document();
        doc["dependencies"] = json!([
            {"id": "com.example.kv", "range": "not a range"},
            {"id": "kv", "range": "^1", "optional": true}
        ]);
        assert_eq!(
            fields(&validate(&doc)),
            vec!["dependencies[0].range", "dependencies[1].optional", "dependencies[1].id"]
        );
    }

    #[test]
    fn signature_block_is_closed() {
        let mut doc = valid_document();
        doc["signature"] = json!({"alg": "ed25519", "pubkey": "ed25519:00", "sig": 7, "kid": "x"});
        assert_eq!(fields(&validate(&doc)), vec!["signature.kid", "signature.sig"]);
    }

    #[test]
    fn partial_signature_block_passes_schema() {
        let mut doc = valid_document();
        doc["signature"] = json!({"alg": "ed25519"});
        assert!(validate(&doc).valid);
    }

    #[test]
    fn non_object_document() {
        let report = validate(&json!([1, 2]));
        assert_eq!(fields(&report), vec!["$"]);
    }

    #[test]
    fn typed_manifest_revalidates() {
        let manifest = parse_manifest(&valid_document()).unwrap();
        assert!(validate_manifest(&manifest).is_ok());
    }
}
