//! Signature Round-Trip Property Tests
//!
//! For any key, a freshly signed manifest verifies, and a single flipped byte
//! in either the signature or the signed payload makes it fail.

#![allow(clippy::unwrap_used)]

use ed25519_dalek::SigningKey;
use proptest::prelude::*;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use serde_json::json;
use tessera_core::{canonicalize, Manifest};
use tessera_manifest::{decode_signature, sign, verify, verify_detached};

fn key_from_seed(seed: u64) -> SigningKey {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    SigningKey::generate(&mut rng)
}

fn manifest(target: &str, deps: usize) -> Manifest {
    let dependencies: Vec<_> = (0..deps)
        .map(|i| json!({"id": format!("com.example.dep{i}"), "range": format!("^{i}.0.0")}))
        .collect();
    Manifest::from_value(json!({
        "id": "com.example.app",
        "version": "2.1.0",
        "chains": ["eip155:1", "eip155:10"],
        "artifact": {
            "type": "wasm",
            "target": target,
            "digest": format!("sha256:{}", "e".repeat(64)),
            "uri": "ipfs://bafybeigdyrztexample"
        },
        "provides": ["app.ui@2"],
        "dependencies": dependencies
    }))
    .unwrap()
}

proptest! {
    #[test]
    fn prop_sign_verify_round_trip(seed in any::<u64>(), target in "[a-z0-9-]{1,16}", deps in 0usize..4) {
        let signed = sign(&manifest(&target, deps), &key_from_seed(seed), None).unwrap();
        prop_assert_eq!(verify(&signed), Ok(true));
    }

    #[test]
    fn prop_flipped_signature_byte_fails(seed in any::<u64>(), index in 0usize..64, mask in 1u8..=255) {
        let key = key_from_seed(seed);
        let signed = sign(&manifest("wasm32-wasi", 1), &key, None).unwrap();
        let sig = decode_signature(signed.signature.as_ref().unwrap().sig.as_deref().unwrap()).unwrap();

        let mut bytes = sig.to_bytes();
        bytes[index] ^= mask;
        let mut tampered = signed.clone();
        tampered.signature.as_mut().unwrap().sig = Some(format!("hex:{}", hex::encode(bytes)));
        prop_assert_eq!(verify(&tampered), Ok(false));
    }

    #[test]
    fn prop_flipped_payload_byte_fails(seed in any::<u64>(), index in any::<prop::sample::Index>(), mask in 1u8..=255) {
        let key = key_from_seed(seed);
        let signed = sign(&manifest("wasm32-wasi", 2), &key, None).unwrap();
        let sig = decode_signature(signed.signature.as_ref().unwrap().sig.as_deref().unwrap()).unwrap();

        let mut payload = canonicalize(&signed).unwrap();
        prop_assert!(verify_detached(&sig, &payload, &key.verifying_key()));
        let i = index.index(payload.len());
        payload[i] ^= mask;
        prop_assert!(!verify_detached(&sig, &payload, &key.verifying_key()));
    }
}

#[test]
fn edited_field_invalidates_signature() {
    let key = key_from_seed(11);
    let signed = sign(&manifest("wasm32-wasi", 1), &key, None).unwrap();

    let mut edited = signed.clone();
    edited.artifact.target = "wasm32-unknown".into();
    assert_eq!(verify(&edited), Ok(false));

    let mut edited = signed.clone();
    edited.dependencies.clear();
    assert_eq!(verify(&edited), Ok(false));
}

#[test]
fn signature_from_another_key_fails() {
    let signed = sign(&manifest("wasm32-wasi", 0), &key_from_seed(1), None).unwrap();
    let other = sign(&manifest("wasm32-wasi", 0), &key_from_seed(2), None).unwrap();

    let mut forged = signed.clone();
    forged.signature.as_mut().unwrap().pubkey = other.signature.unwrap().pubkey;
    assert_eq!(verify(&forged), Ok(false));
}

#[test]
fn reordered_document_still_verifies() {
    let key = key_from_seed(5);
    let signed = sign(&manifest("wasm32-wasi", 1), &key, None).unwrap();
    let block = signed.signature.clone().unwrap();

    let text = format!(
        r#"{{
            "signature": {{"sig": "{}", "pubkey": "{}", "alg": "ED25519"}},
            "dependencies": [{{"range": "^0.0.0", "id": "com.example.dep0"}}],
            "provides": ["app.ui@2"],
            "artifact": {{"uri": "ipfs://bafybeigdyrztexample", "digest": "sha256:{}", "target": "wasm32-wasi", "type": "wasm"}},
            "chains": ["eip155:1", "eip155:10"],
            "version": "2.1.0",
            "id": "com.example.app"
        }}"#,
        block.sig.unwrap(),
        block.pubkey.unwrap(),
        "e".repeat(64)
    );
    let reparsed = Manifest::from_value(serde_json::from_str(&text).unwrap()).unwrap();
    assert_eq!(verify(&reparsed), Ok(true));
}
