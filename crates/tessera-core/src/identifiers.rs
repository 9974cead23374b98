//! Validated identifier newtypes
//!
//! Every identifier that appears in a manifest is a string with a fixed
//! grammar. The newtypes here refuse to exist in an invalid state: they are
//! only constructed through `FromStr`/`TryFrom<String>`, and serde routes
//! through the same checks.

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compiled schema patterns shared by the typed decoder and the validator.
pub mod patterns {
    use super::*;

    /// Reverse-domain package identifier, e.g. `com.example.app`.
    pub const PACKAGE_ID: &str = r"^[a-z0-9]+(\.[a-z0-9-]+)+$";
    /// Interface reference, e.g. `kv.store@1`.
    pub const INTERFACE_REF: &str = r"^[a-z0-9.]+@[0-9]+$";
    /// Content digest, e.g. `sha256:` followed by 64 lowercase hex digits.
    pub const SHA256_DIGEST: &str = r"^sha256:[0-9a-f]{64}$";

    /// URI schemes an artifact may be fetched from.
    pub const ARTIFACT_URI_SCHEMES: &[&str] = &["https://", "ipfs://"];

    #[allow(clippy::expect_used)] // literal patterns above are valid
    fn compile(pattern: &str) -> Regex {
        Regex::new(pattern).expect("schema pattern must compile")
    }

    static PACKAGE_ID_RE: Lazy<Regex> = Lazy::new(|| compile(PACKAGE_ID));
    static INTERFACE_REF_RE: Lazy<Regex> = Lazy::new(|| compile(INTERFACE_REF));
    static SHA256_DIGEST_RE: Lazy<Regex> = Lazy::new(|| compile(SHA256_DIGEST));

    /// True if `s` is a reverse-domain package identifier.
    pub fn is_package_id(s: &str) -> bool {
        PACKAGE_ID_RE.is_match(s)
    }

    /// True if `s` is a `name@major` interface reference.
    pub fn is_interface_ref(s: &str) -> bool {
        INTERFACE_REF_RE.is_match(s)
    }

    /// True if `s` is a `sha256:<64 hex>` digest.
    pub fn is_sha256_digest(s: &str) -> bool {
        SHA256_DIGEST_RE.is_match(s)
    }

    /// True if `s` uses one of the accepted artifact URI schemes.
    pub fn is_artifact_uri(s: &str) -> bool {
        ARTIFACT_URI_SCHEMES
            .iter()
            .any(|scheme| s.len() > scheme.len() && s.starts_with(scheme))
    }

    /// True if `s` is a usable chain identifier.
    pub fn is_chain_id(s: &str) -> bool {
        !s.is_empty() && !s.chars().any(char::is_whitespace)
    }
}

/// Error returned when a string does not match an identifier grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {expected}")]
pub struct IdentifierError {
    /// What kind of identifier was expected
    pub expected: &'static str,
    /// The rejected input
    pub value: String,
}

macro_rules! validated_string {
    ($(#[$meta:meta])* $name:ident, $expected:literal, $check:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Borrow the identifier text
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                if $check(&value) {
                    Ok(Self(value))
                } else {
                    Err(IdentifierError {
                        expected: $expected,
                        value,
                    })
                }
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

validated_string!(
    /// Reverse-domain package identifier (`com.example.app`)
    PackageId,
    "package id",
    patterns::is_package_id
);

validated_string!(
    /// Identifier of a chain a bundle targets
    ChainId,
    "chain id",
    patterns::is_chain_id
);

validated_string!(
    /// Capability interface reference of the form `name@major`
    InterfaceRef,
    "interface reference",
    patterns::is_interface_ref
);

validated_string!(
    /// `sha256:<64 lowercase hex>` content digest
    ContentDigest,
    "sha256 digest",
    patterns::is_sha256_digest
);

validated_string!(
    /// Artifact location, restricted to `https://` and `ipfs://`
    ArtifactUri,
    "artifact uri",
    patterns::is_artifact_uri
);

impl InterfaceRef {
    /// Interface name without the major version
    pub fn name(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(name, _)| name)
    }

    /// Integer major version, `None` if it does not fit in a `u64`
    pub fn major(&self) -> Option<u64> {
        self.0
            .split_once('@')
            .and_then(|(_, major)| major.parse().ok())
    }
}

impl ContentDigest {
    /// Build a digest from raw SHA-256 output
    pub fn from_sha256(bytes: &[u8; 32]) -> Self {
        Self(format!("sha256:{}", hex::encode(bytes)))
    }
}

/// One published record, addressed as `id@version`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageRef {
    /// Package identifier
    pub id: PackageId,
    /// Exact version
    pub version: Version,
}

impl PackageRef {
    /// Create a package reference
    pub fn new(id: PackageId, version: Version) -> Self {
        Self { id, version }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

impl FromStr for PackageRef {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdentifierError {
            expected: "package reference (id@version)",
            value: s.to_string(),
        };
        let (id, version) = s.split_once('@').ok_or_else(invalid)?;
        let id = id.parse::<PackageId>().map_err(|_| invalid())?;
        let version = Version::parse(version).map_err(|_| invalid())?;
        Ok(Self { id, version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_id_requires_reverse_domain() {
        assert!("com.example.app".parse::<PackageId>().is_ok());
        assert!("io.tessera.kv-store".parse::<PackageId>().is_ok());
        assert!("app".parse::<PackageId>().is_err());
        assert!("Com.Example".parse::<PackageId>().is_err());
        assert!("com..example".parse::<PackageId>().is_err());
    }

    #[test]
    fn interface_ref_parts() {
        let iface: InterfaceRef = "kv.store@1".parse().unwrap();
        assert_eq!(iface.name(), "kv.store");
        assert_eq!(iface.major(), Some(1));
        assert!("kv.store".parse::<InterfaceRef>().is_err());
        assert!("kv.store@v1".parse::<InterfaceRef>().is_err());
    }

    #[test]
    fn digest_and_uri_grammar() {
        let digest = format!("sha256:{}", "ab".repeat(32));
        assert!(digest.parse::<ContentDigest>().is_ok());
        assert!(format!("sha256:{}", "AB".repeat(32))
            .parse::<ContentDigest>()
            .is_err());
        assert!("https://cdn.example/app.wasm".parse::<ArtifactUri>().is_ok());
        assert!("ipfs://bafy".parse::<ArtifactUri>().is_ok());
        assert!("http://cdn.example/app.wasm".parse::<ArtifactUri>().is_err());
        assert!("https://".parse::<ArtifactUri>().is_err());
    }

    #[test]
    fn package_ref_round_trips_through_display() {
        let pkg: PackageRef = "com.example.app@1.2.3-beta.1".parse().unwrap();
        assert_eq!(pkg.id.as_str(), "com.example.app");
        assert_eq!(pkg.to_string(), "com.example.app@1.2.3-beta.1");
        assert!("com.example.app".parse::<PackageRef>().is_err());
    }

    #[test]
    fn serde_rejects_invalid_identifiers() {
        let ok: Result<PackageId, _> = serde_json::from_str("\"com.example.app\"");
        assert!(ok.is_ok());
        let bad: Result<PackageId, _> = serde_json::from_str("\"not an id\"");
        assert!(bad.is_err());
    }
}
