//! Interface satisfaction
//!
//! Cross-checks `requires` against `provides` over a resolved set. Only
//! meaningful once resolution has succeeded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tessera_core::{InterfaceRef, Manifest};

/// Required interfaces split by whether the resolved set provides them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceReport {
    /// Required and provided, sorted and de-duplicated
    pub satisfies: Vec<InterfaceRef>,
    /// Required but provided by nobody, sorted and de-duplicated
    pub missing: Vec<InterfaceRef>,
}

impl InterfaceReport {
    /// True when every requirement is provided
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check every `requires` entry against the union of `provides`
pub fn check<'m, I>(manifests: I) -> InterfaceReport
where
    I: IntoIterator<Item = &'m Manifest>,
{
    let mut provided = BTreeSet::new();
    let mut required = BTreeSet::new();
    for manifest in manifests {
        provided.extend(manifest.provides.iter());
        required.extend(manifest.requires.iter());
    }

    let (satisfies, missing): (Vec<&InterfaceRef>, Vec<&InterfaceRef>) = required
        .into_iter()
        .partition(|interface| provided.contains(interface));

    InterfaceReport {
        satisfies: satisfies.into_iter().cloned().collect(),
        missing: missing.into_iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_testkit::manifest;

    #[test]
    fn unprovided_requirement_is_missing() {
        let app = manifest("com.example.app", "1.0.0").requires("kv.store@1").build();
        let report = check([&app]);
        assert_eq!(report.missing, vec!["kv.store@1".parse().unwrap()]);
        assert!(report.satisfies.is_empty());
    }

    #[test]
    fn major_versions_are_distinct_interfaces() {
        let app = manifest("com.example.app", "1.0.0").requires("kv.store@2").build();
        let kv = manifest("com.example.kv", "1.0.0").provides("kv.store@1").build();
        let report = check([&app, &kv]);
        assert!(!report.is_satisfied());
    }

    #[test]
    fn results_are_sorted_and_deduplicated() {
        let app = manifest("com.example.app", "1.0.0")
            .requires("log.sink@1")
            .requires("kv.store@1")
            .build();
        let lib = manifest("com.example.lib", "1.0.0")
            .requires("kv.store@1")
            .provides("kv.store@1")
            .provides("log.sink@1")
            .build();
        let report = check([&app, &lib]);
        let names: Vec<_> = report.satisfies.iter().map(|i| i.to_string()).collect();
        assert_eq!(names, ["kv.store@1", "log.sink@1"]);
        assert!(report.is_satisfied());
    }

    #[test]
    fn provides_alone_satisfy_nothing() {
        let lib = manifest("com.example.lib", "1.0.0").provides("kv.store@1").build();
        assert_eq!(check([&lib]), InterfaceReport::default());
    }
}
