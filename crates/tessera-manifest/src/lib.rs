//! Tessera Manifest - validation and signatures
//!
//! The two gates a manifest passes before it is trusted:
//!
//! 1. [`validation`]: pure structural check of the raw document against the
//!    closed schema, reporting every issue with its field path
//! 2. [`signature`]: Ed25519 verification over the canonical bytes, with the
//!    unsigned-manifest policy passed in explicitly
//!
//! Validation always runs first; signatures are only meaningful over a
//! document whose structure is already known to be sound.

#![forbid(unsafe_code)]

/// Ed25519 manifest signatures
pub mod signature;

/// Closed-schema validation
pub mod validation;

pub use signature::{
    check_signature, decode_public_key, decode_signature, encode_public_key, sign, verify,
    verify_detached, SignatureError, SignatureStatus, SUPPORTED_ALGORITHM,
};
pub use validation::{parse_manifest, validate, validate_manifest, ValidationReport};

pub use ed25519_dalek::{SigningKey, VerifyingKey};
