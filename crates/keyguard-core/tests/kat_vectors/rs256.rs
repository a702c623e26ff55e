//! RS256 tokens checked against an independent PKCS#1 v1.5 / SHA-256 signer.
//!
//! PKCS#1 v1.5 signatures are deterministic, so the same key and signing input
//! must produce byte-identical signatures.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use keyguard_core::keypair::{KeyPair, KeyPairGenerator};
use keyguard_core::token::{TokenClaims, TokenService};
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::OnceLock;
use std::time::Duration;

const NOW: u64 = 1_700_000_000;

fn key_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| {
        KeyPairGenerator::default()
            .generate(2048)
            .expect("generation should succeed")
    })
}

fn issue() -> String {
    TokenService::default()
        .sign_at(
            &TokenClaims::new().with("sub", "kat"),
            &key_pair().private,
            Duration::from_secs(600),
            NOW,
        )
        .expect("sign should succeed")
}

#[test]
fn signature_matches_reference_signer() {
    let token = issue();
    let (signing_input, signature) = token.rsplit_once('.').expect("three segments");

    let private = RsaPrivateKey::from_pkcs8_pem(key_pair().private.expose()).expect("parse");
    let reference = SigningKey::<Sha256>::new(private).sign(signing_input.as_bytes());
    assert_eq!(signature, URL_SAFE_NO_PAD.encode(reference.to_bytes()));
}

#[test]
fn segments_decode_to_expected_json() {
    let token = issue();
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);

    let header: Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).expect("base64url"))
            .expect("header JSON");
    assert_eq!(header, json!({ "alg": "RS256", "typ": "JWT" }));

    let payload: Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).expect("base64url"))
            .expect("payload JSON");
    assert_eq!(
        payload,
        json!({ "iat": NOW, "exp": NOW + 600, "sub": "kat" })
    );

    // 2048-bit signature is 256 bytes.
    assert_eq!(URL_SAFE_NO_PAD.decode(parts[2]).expect("base64url").len(), 256);
}

#[test]
fn issuance_is_deterministic_for_fixed_time() {
    assert_eq!(issue(), issue());
}
