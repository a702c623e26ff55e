//! Slow operations driven from async code through the blocking pool.

use super::{fast_params, key_pair};
use keyguard_core::keypair::KeyPairGenerator;
use keyguard_core::password::PasswordHasher;
use keyguard_core::CryptoError;
use secrecy::SecretString;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hash_and_verify_off_the_executor() {
    let hasher = PasswordHasher::new(fast_params()).expect("hasher should build");
    let record = hasher
        .spawn_hash(SecretString::from("async secret"))
        .expect("spawn should succeed")
        .await
        .expect("hash should succeed")
        .encode();

    let ok = PasswordHasher::spawn_verify(record.clone(), SecretString::from("async secret"))
        .expect("spawn should succeed")
        .await
        .expect("verify task should complete");
    assert!(ok);

    let wrong = PasswordHasher::spawn_verify(record, SecretString::from("nope"))
        .expect("spawn should succeed")
        .await
        .expect("verify task should complete");
    assert!(!wrong);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn executor_stays_responsive_during_hashing() {
    let hasher = PasswordHasher::new(fast_params()).expect("hasher should build");
    let tasks: Vec<_> = (0..4)
        .map(|i| {
            hasher
                .spawn_hash(SecretString::from(format!("password-{i}")))
                .expect("spawn should succeed")
        })
        .collect();

    // A timer on the async executor still fires while the pool is busy.
    tokio::time::timeout(Duration::from_secs(5), tokio::time::sleep(Duration::from_millis(1)))
        .await
        .expect("executor should not be blocked");

    for task in tasks {
        task.await.expect("hash should succeed");
    }
}

#[tokio::test]
async fn unsupported_modulus_fails_before_scheduling() {
    let err = KeyPairGenerator::default()
        .spawn_generate(1024)
        .expect_err("1024 bits should be refused");
    assert!(matches!(err, CryptoError::UnsupportedModulusSize { .. }));
}

#[tokio::test]
async fn cancelled_keygen_task_yields_cancelled_and_does_not_disturb_others() {
    let task = KeyPairGenerator::default()
        .spawn_generate(2048)
        .expect("spawn should succeed");
    task.cancel();
    let err = task.await.expect_err("cancelled keygen should not yield a pair");
    assert!(matches!(err, CryptoError::Cancelled));

    // The shared pair is still usable afterwards.
    let public_bits = key_pair()
        .public
        .modulus_bits()
        .expect("public key should parse");
    assert_eq!(public_bits, 2048);
}
