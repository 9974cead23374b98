//! Registry configuration
//!
//! Loaded from a TOML file, then overridden by `TESSERA_*` environment
//! variables, then validated. Every policy the core applies is a field here;
//! nothing is decided by a hidden default inside the components.

use crate::errors::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Default bound on path length from the resolve root
pub const DEFAULT_MAX_RESOLVE_DEPTH: usize = 32;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "TESSERA_";

/// What to do with a manifest that carries no signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsignedPolicy {
    /// Unsigned manifests are valid but reported as unsigned
    Accept,
    /// Unsigned manifests are rejected as `invalid_signature`
    Reject,
}

impl FromStr for UnsignedPolicy {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            other => Err(RegistryError::config(format!(
                "unsigned_policy must be 'accept' or 'reject', got '{other}'"
            ))),
        }
    }
}

/// Registry-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Longest allowed path from the resolve root to any dependency
    pub max_resolve_depth: usize,
    /// Treatment of unsigned manifests
    pub unsigned_policy: UnsignedPolicy,
    /// Re-check signatures of every resolved manifest
    pub verify_signatures_on_resolve: bool,
    /// Fail resolution when required interfaces are missing
    pub strict_interfaces: bool,
    /// Public base URL used to build canonical manifest URIs
    pub base_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_resolve_depth: DEFAULT_MAX_RESOLVE_DEPTH,
            unsigned_policy: UnsignedPolicy::Reject,
            verify_signatures_on_resolve: true,
            strict_interfaces: false,
            base_url: "https://registry.local".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RegistryError::config(format!("invalid TOML: {e}")))
    }

    /// Load a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `TESSERA_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `TESSERA_*` overrides from an explicit variable list
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match name {
                "MAX_RESOLVE_DEPTH" => {
                    self.max_resolve_depth = value.parse().map_err(|_| {
                        RegistryError::config(format!(
                            "TESSERA_MAX_RESOLVE_DEPTH must be an integer, got '{value}'"
                        ))
                    })?;
                }
                "UNSIGNED_POLICY" => self.unsigned_policy = value.parse()?,
                "VERIFY_SIGNATURES_ON_RESOLVE" => {
                    self.verify_signatures_on_resolve = parse_bool(name, value)?;
                }
                "STRICT_INTERFACES" => self.strict_interfaces = parse_bool(name, value)?,
                "BASE_URL" => self.base_url = value.trim_end_matches('/').to_string(),
                _ => tracing::debug!(variable = %key.as_ref(), "ignoring unknown override"),
            }
        }
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_resolve_depth == 0 {
            return Err(RegistryError::config("max_resolve_depth must be at least 1"));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(RegistryError::config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Defaults, then `path` if given, then environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RegistryError::config(format!(
            "{ENV_PREFIX}{name} must be a boolean, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = RegistryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_resolve_depth, DEFAULT_MAX_RESOLVE_DEPTH);
        assert_eq!(config.unsigned_policy, UnsignedPolicy::Reject);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RegistryConfig::from_toml_str(
            r#"
            max_resolve_depth = 8
            unsigned_policy = "accept"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_resolve_depth, 8);
        assert_eq!(config.unsigned_policy, UnsignedPolicy::Accept);
        assert!(config.verify_signatures_on_resolve);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(RegistryConfig::from_toml_str("max_depth = 3").is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = RegistryConfig::default();
        config
            .merge_with_vars([
                ("TESSERA_MAX_RESOLVE_DEPTH", "4"),
                ("TESSERA_STRICT_INTERFACES", "true"),
                ("TESSERA_BASE_URL", "https://registry.example/"),
                ("HOME", "/root"),
            ])
            .unwrap();
        assert_eq!(config.max_resolve_depth, 4);
        assert!(config.strict_interfaces);
        assert_eq!(config.base_url, "https://registry.example");
    }

    #[test]
    fn bad_override_is_a_config_error() {
        let mut config = RegistryConfig::default();
        let err = config
            .merge_with_vars([("TESSERA_MAX_RESOLVE_DEPTH", "deep")])
            .unwrap_err();
        assert_eq!(err.code(), "invalid_config");
    }

    #[test]
    fn zero_depth_fails_validation() {
        let config = RegistryConfig {
            max_resolve_depth: 0,
            ..RegistryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strict_interfaces = true").unwrap();
        let config = RegistryConfig::load_from_file(file.path()).unwrap();
        assert!(config.strict_interfaces);
    }
}
