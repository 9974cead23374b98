//! Key generation

use crate::io::write_secret;
use anyhow::Result;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use std::path::Path;
use tessera_manifest::encode_public_key;
use tracing::info;

/// Generate an Ed25519 key pair.
///
/// The secret is written as hex to `output` with owner-only permissions, or
/// returned when no path is given. The public key is always reported in its
/// manifest form.
pub fn keygen(output: Option<&Path>) -> Result<String> {
    let key = SigningKey::generate(&mut OsRng);
    let public = encode_public_key(&key.verifying_key());
    info!(pubkey = %public, "generated signing key");

    let secret = hex::encode(key.to_bytes());
    match output {
        Some(path) => {
            let written = write_secret(path, &secret)?;
            Ok(format!("{written}\npubkey: {public}"))
        }
        None => Ok(format!("secret: {secret}\npubkey: {public}")),
    }
}
