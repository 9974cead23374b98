//! CLI Command Handlers

/// Key generation
pub mod keys;

/// Manifest signing, verification, validation and canonical form
pub mod manifest;

/// Dependency resolution over a local catalog
pub mod resolve;
