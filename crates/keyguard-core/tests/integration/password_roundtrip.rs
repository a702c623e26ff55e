//! Argon2id password records across hashers, configs, and the `argon2` crate.

use super::fast_params;
use argon2::password_hash::{PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use keyguard_core::password::{Argon2idParams, PasswordHashRecord, PasswordHasher};
use keyguard_core::{CryptoConfig, CryptoError};

#[test]
fn record_from_config_verifies() {
    let config = CryptoConfig::from_json(r#"{ "password": { "m_cost": 64, "t_cost": 1 } }"#)
        .expect("config should parse");
    let hasher = PasswordHasher::from_config(&config).expect("hasher should build");
    let record = hasher.hash(b"hunter2").expect("hash should succeed").encode();
    assert!(record.starts_with("$argon2id$v=19$m=64,t=1,p=1$"), "{record}");
    assert!(PasswordHasher::verify(&record, b"hunter2"));
    assert!(!PasswordHasher::verify(&record, b"hunter3"));
}

#[test]
fn argon2_crate_accepts_our_records() {
    let record = PasswordHasher::new(fast_params())
        .expect("hasher should build")
        .hash(b"interop")
        .expect("hash should succeed")
        .encode();
    let parsed = argon2::PasswordHash::new(&record).expect("argon2 should parse our record");
    Argon2::default()
        .verify_password(b"interop", &parsed)
        .expect("argon2 should verify our record");
}

#[test]
fn we_accept_argon2_crate_records() {
    let params = Params::new(64, 1, 1, Some(32)).expect("params should be valid");
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::encode_b64(&[0x5A; 16]).expect("salt should encode");
    let foreign = argon2
        .hash_password(b"interop", &salt)
        .expect("argon2 should hash")
        .to_string();
    assert!(PasswordHasher::verify(&foreign, b"interop"));
    assert!(!PasswordHasher::verify(&foreign, b"Interop"));
}

#[test]
fn rehash_is_needed_after_cost_increase() {
    let old = PasswordHasher::new(fast_params())
        .expect("hasher should build")
        .hash(b"pw")
        .expect("hash should succeed")
        .encode();
    let upgraded = PasswordHasher::new(Argon2idParams {
        t_cost: 2,
        ..fast_params()
    })
    .expect("hasher should build");
    assert!(upgraded.needs_rehash(&old));
    assert!(PasswordHasher::verify(&old, b"pw"));

    let fresh = upgraded.hash(b"pw").expect("hash should succeed").encode();
    assert!(!upgraded.needs_rehash(&fresh));
}

#[test]
fn other_algorithms_never_verify() {
    let argon2i = "$argon2i$v=19$m=64,t=1,p=1$WlpaWlpaWlpaWlpaWlpaWg$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    assert!(!PasswordHasher::verify(argon2i, b"pw"));
    let err = argon2i
        .parse::<PasswordHashRecord>()
        .expect_err("argon2i should be refused");
    assert!(matches!(err, CryptoError::UnsupportedAlgorithm(_)));
    assert!(!PasswordHasher::verify("$2b$12$abcdefghijklmnopqrstuv", b"pw"));
}
