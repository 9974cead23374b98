//! Manifest signatures
//!
//! Ed25519 over the canonical bytes of a manifest. Verification separates
//! three outcomes:
//!
//! - a structurally malformed block (missing `alg`, `pubkey` or `sig`) is a
//!   [`SignatureError`]
//! - anything that merely fails to verify (unsupported algorithm, bad
//!   encoding, wrong length, invalid point, mismatch) is `Ok(false)`
//! - a valid signature is `Ok(true)`
//!
//! Whether an unsigned manifest is acceptable is never decided here; callers
//! pass an [`UnsignedPolicy`] to [`check_signature`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use tessera_core::{canonicalize, Manifest, ManifestSignature, RegistryError, UnsignedPolicy};
use tracing::debug;

/// The single supported signature algorithm
pub const SUPPORTED_ALGORITHM: &str = "ed25519";

/// Prefix accepted on public keys
pub const PUBKEY_PREFIX: &str = "ed25519:";

const BASE64_PREFIX: &str = "base64:";
const HEX_PREFIX: &str = "hex:";

/// Structural signature failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The manifest carries no signature block
    #[error("manifest is not signed")]
    Unsigned,

    /// A mandatory member of the signature block is absent or empty
    #[error("signature block is missing '{field}'")]
    MissingField {
        /// Name of the absent member
        field: &'static str,
    },

    /// The canonical payload could not be produced
    #[error("canonical payload unavailable: {message}")]
    Payload {
        /// Underlying failure
        message: String,
    },
}

/// Result of a policy-aware signature check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Signature present and valid
    Verified,
    /// No signature, accepted by policy
    Unsigned,
}

/// Verify the signature of `manifest` over its canonical bytes
pub fn verify(manifest: &Manifest) -> Result<bool, SignatureError> {
    let block = manifest.signature.as_ref().ok_or(SignatureError::Unsigned)?;
    let alg = required(&block.alg, "alg")?;
    let pubkey = required(&block.pubkey, "pubkey")?;
    let sig = required(&block.sig, "sig")?;

    let package = manifest.package_ref();
    if !alg.eq_ignore_ascii_case(SUPPORTED_ALGORITHM) {
        debug!(%package, alg, "unsupported signature algorithm");
        return Ok(false);
    }
    let Some(key) = decode_public_key(pubkey) else {
        debug!(%package, "public key does not decode to an ed25519 point");
        return Ok(false);
    };
    let Some(signature) = decode_signature(sig) else {
        debug!(%package, "signature does not decode to 64 bytes");
        return Ok(false);
    };
    let payload = canonicalize(manifest).map_err(|e| SignatureError::Payload {
        message: e.to_string(),
    })?;

    let valid = verify_detached(&signature, &payload, &key);
    if !valid {
        debug!(%package, "signature does not match canonical payload");
    }
    Ok(valid)
}

/// Ed25519 check of `signature` over `payload`.
///
/// Uses strict verification, which also rejects small-order keys and
/// non-canonical signature scalars.
pub fn verify_detached(signature: &Signature, payload: &[u8], key: &VerifyingKey) -> bool {
    key.verify_strict(payload, signature).is_ok()
}

/// Apply the unsigned policy and map the outcome onto the error taxonomy
pub fn check_signature(
    manifest: &Manifest,
    policy: UnsignedPolicy,
) -> tessera_core::Result<SignatureStatus> {
    let package = manifest.package_ref();
    match verify(manifest) {
        Ok(true) => Ok(SignatureStatus::Verified),
        Ok(false) => Err(RegistryError::invalid_signature(
            package,
            "signature does not verify",
        )),
        Err(SignatureError::Unsigned) => match policy {
            UnsignedPolicy::Accept => Ok(SignatureStatus::Unsigned),
            UnsignedPolicy::Reject => Err(RegistryError::invalid_signature(
                package,
                "manifest is unsigned and unsigned manifests are rejected",
            )),
        },
        Err(e @ SignatureError::MissingField { .. }) => Err(RegistryError::invalid_signature(
            package,
            format!("malformed signature block: {e}"),
        )),
        Err(SignatureError::Payload { message }) => Err(RegistryError::internal(message)),
    }
}

/// Sign `manifest`, returning a copy carrying the new signature block
pub fn sign(
    manifest: &Manifest,
    key: &SigningKey,
    signed_at: Option<String>,
) -> tessera_core::Result<Manifest> {
    let payload = canonicalize(manifest)?;
    let signature = key.sign(&payload);
    Ok(Manifest {
        signature: Some(ManifestSignature {
            alg: Some(SUPPORTED_ALGORITHM.to_string()),
            pubkey: Some(encode_public_key(&key.verifying_key())),
            sig: Some(format!("{BASE64_PREFIX}{}", BASE64.encode(signature.to_bytes()))),
            signed_at,
        }),
        ..manifest.clone()
    })
}

/// `ed25519:<hex>` form of a public key
pub fn encode_public_key(key: &VerifyingKey) -> String {
    format!("{PUBKEY_PREFIX}{}", hex::encode(key.as_bytes()))
}

/// Decode a public key, with or without the `ed25519:` prefix
pub fn decode_public_key(text: &str) -> Option<VerifyingKey> {
    let body = strip_prefix_ignore_case(text, PUBKEY_PREFIX).unwrap_or(text);
    let bytes = decode_unprefixed(body, 32)?;
    let bytes: [u8; 32] = bytes.try_into().ok()?;
    VerifyingKey::from_bytes(&bytes).ok()
}

/// Decode a signature with an optional `base64:` or `hex:` prefix
pub fn decode_signature(text: &str) -> Option<Signature> {
    let bytes = if let Some(body) = strip_prefix_ignore_case(text, BASE64_PREFIX) {
        BASE64.decode(body).ok()?
    } else if let Some(body) = strip_prefix_ignore_case(text, HEX_PREFIX) {
        hex::decode(body).ok()?
    } else {
        decode_unprefixed(text, 64)?
    };
    let bytes: [u8; 64] = bytes.try_into().ok()?;
    Some(Signature::from_bytes(&bytes))
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, SignatureError> {
    match value.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(SignatureError::MissingField { field }),
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

/// Hex when the text is exactly the hex length of `len` bytes, base64 otherwise
fn decode_unprefixed(text: &str, len: usize) -> Option<Vec<u8>> {
    if text.len() == len * 2 && text.bytes().all(|b| b.is_ascii_hexdigit()) {
        hex::decode(text).ok()
    } else {
        BASE64.decode(text).ok()
    }
}
