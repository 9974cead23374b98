//! Tessera Testkit - shared test utilities
//!
//! Deterministic fixtures for the registry test suites:
//!
//! - [`KeyFixture`]: Ed25519 keys derived from a seed
//! - [`ManifestBuilder`] / [`CatalogBuilder`]: concise construction of valid
//!   manifests and catalogs
//! - [`strategies`]: proptest strategies for identifiers and acyclic catalogs
//!
//! Fixtures panic on misuse; they are only meant for tests.

#![forbid(unsafe_code)]
#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]

pub mod builders;
pub mod keys;
pub mod strategies;

pub use builders::{manifest, pkg, CatalogBuilder, ManifestBuilder};
pub use keys::KeyFixture;
