//! Key test helpers
//!
//! Standardized, seed-derived signing keys so that signed fixtures are
//! reproducible across runs.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use sha2::{Digest, Sha256};
use tessera_core::Manifest;

/// Deterministic Ed25519 key
#[derive(Debug, Clone)]
pub struct KeyFixture {
    signing_key: SigningKey,
}

impl KeyFixture {
    /// Key generated from a seeded ChaCha stream
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Key whose secret is the SHA-256 of `seed`
    pub fn from_seed_string(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&digest);
        Self {
            signing_key: SigningKey::from_bytes(&secret),
        }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// `ed25519:<hex>` text form of the public key
    pub fn public_key_text(&self) -> String {
        tessera_manifest::encode_public_key(&self.verifying_key())
    }

    /// Sign a manifest with a fixed timestamp
    pub fn sign(&self, manifest: &Manifest) -> Manifest {
        tessera_manifest::sign(manifest, &self.signing_key, Some("2026-01-01T00:00:00Z".into()))
            .expect("fixture manifest must canonicalize")
    }
}
