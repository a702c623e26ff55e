//! RSA-OAEP wrapping of symmetric keys between independently held key pairs.

use super::key_pair;
use keyguard_core::keypair::{PrivateKeyPem, PublicKeyPem};
use keyguard_core::keywrap::{unwrap, unwrap_key, wrap, wrap_key, WrappedKey};
use keyguard_core::symmetric::{decrypt, encrypt};
use keyguard_core::{CryptoError, SymmetricKey};

#[test]
fn wrapped_data_key_decrypts_payload() {
    let pair = key_pair();
    let data_key = SymmetricKey::generate().expect("key generation should succeed");
    let payload = encrypt(b"envelope contents", data_key.expose())
        .expect("encrypt should succeed")
        .encode();

    let wrapped = wrap_key(&pair.public, &data_key).expect("wrap should succeed");
    let recovered = unwrap(&pair.private, &wrapped.encode()).expect("unwrap should succeed");

    let plaintext = decrypt(&payload, recovered.expose()).expect("decrypt should succeed");
    assert_eq!(plaintext.expose(), b"envelope contents");
}

#[test]
fn public_key_derived_from_private_pem_wraps_compatibly() {
    let pair = key_pair();
    let public = pair.private.public_key().expect("public key should derive");
    assert_eq!(public, pair.public);
    let wrapped = wrap(&public, &[0x11; 32]).expect("wrap should succeed");
    let key = unwrap_key(&pair.private, &wrapped).expect("unwrap should succeed");
    assert_eq!(key.expose(), &[0x11; 32]);
}

#[test]
fn pem_strings_survive_storage() {
    let pair = key_pair();
    let stored_public = pair.public.to_string();
    let stored_private = pair.private.expose().to_owned();

    let wrapped = wrap(&PublicKeyPem::new(stored_public), &[0x22; 32]).expect("wrap should succeed");
    let key = unwrap(&PrivateKeyPem::new(stored_private), &wrapped.encode())
        .expect("unwrap should succeed");
    assert_eq!(key.expose(), &[0x22; 32]);
}

#[test]
fn truncated_wrapped_key_fails_uniformly() {
    let pair = key_pair();
    let wrapped = wrap(&pair.public, &[0x33; 32]).expect("wrap should succeed");
    let encoded = wrapped.encode();
    let truncated = &encoded[..encoded.len() - 8];
    assert!(matches!(
        unwrap(&pair.private, truncated),
        Err(CryptoError::UnwrapFailure)
    ));
    let decoded = WrappedKey::decode(&encoded).expect("decode should succeed");
    assert_eq!(decoded, wrapped);
}
