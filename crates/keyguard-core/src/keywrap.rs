//! RSA-OAEP key wrapping.
//!
//! A 32-byte [`SymmetricKey`] is encrypted under a recipient's RSA public key
//! with OAEP, SHA-256 as both the label hash and the MGF1 hash. The wrapped
//! form is exactly one modulus long.
//!
//! # Failure surface
//!
//! [`unwrap`] reports every failure as [`CryptoError::UnwrapFailure`]:
//! undecodable input, wrong length, unparseable key, bad padding, wrong key,
//! or a recovered key that is not 32 bytes. All of these flow through one
//! `Option` chain and are turned into an error at a single point, so no
//! caller can tell which step rejected the input.
//!
//! The `rsa` crate's decryption is not guaranteed constant-time
//! (RUSTSEC-2023-0071); blinding is enabled, but callers exposing unwrap to
//! untrusted input at high rates should rate-limit it.

use crate::error::CryptoError;
use crate::keypair::{PrivateKeyPem, PublicKeyPem};
use crate::memory::{SymmetricKey, SYMMETRIC_KEY_LEN};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::Oaep;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// A symmetric key encrypted under an RSA public key.
#[must_use = "a wrapped key must be stored or transmitted"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedKey(Vec<u8>);

impl WrappedKey {
    /// Raw OAEP ciphertext.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Base64 text form.
    #[must_use]
    pub fn encode(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Parse the base64 text form. Length is checked against the key on unwrap.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MalformedPayload` for invalid base64.
    pub fn decode(encoded: &str) -> Result<Self, CryptoError> {
        STANDARD
            .decode(encoded.trim())
            .map(Self)
            .map_err(|e| CryptoError::MalformedPayload(format!("invalid base64: {e}")))
    }
}

impl fmt::Display for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for WrappedKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for WrappedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for WrappedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Wrap raw key bytes under `public_key`.
///
/// # Errors
///
/// - `CryptoError::InvalidKeyLength` unless `raw_key` is 32 bytes
/// - `CryptoError::InvalidKeyMaterial` if the public key PEM does not parse
/// - `CryptoError::Encryption` if OAEP encryption fails
pub fn wrap(public_key: &PublicKeyPem, raw_key: &[u8]) -> Result<WrappedKey, CryptoError> {
    if raw_key.len() != SYMMETRIC_KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: SYMMETRIC_KEY_LEN,
            actual: raw_key.len(),
        });
    }
    let key = public_key.parse()?;
    let ciphertext = key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), raw_key)
        .map_err(|e| CryptoError::Encryption(format!("RSA-OAEP wrap failed: {e}")))?;
    debug_assert_eq!(ciphertext.len(), key.size());
    tracing::debug!(modulus_bytes = key.size(), "symmetric key wrapped");
    Ok(WrappedKey(ciphertext))
}

/// Wrap a [`SymmetricKey`] under `public_key`.
///
/// # Errors
///
/// Same as [`wrap`], minus the length error.
pub fn wrap_key(public_key: &PublicKeyPem, key: &SymmetricKey) -> Result<WrappedKey, CryptoError> {
    wrap(public_key, key.expose())
}

/// Recover a [`SymmetricKey`] from its base64 wrapped form.
///
/// # Errors
///
/// Returns `CryptoError::UnwrapFailure` for every failure cause.
pub fn unwrap(private_key: &PrivateKeyPem, wrapped: &str) -> Result<SymmetricKey, CryptoError> {
    let ciphertext = STANDARD.decode(wrapped.trim()).ok();
    recover(private_key, ciphertext.as_deref())
}

/// Recover a [`SymmetricKey`] from an already decoded [`WrappedKey`].
///
/// # Errors
///
/// Returns `CryptoError::UnwrapFailure` for every failure cause.
pub fn unwrap_key(
    private_key: &PrivateKeyPem,
    wrapped: &WrappedKey,
) -> Result<SymmetricKey, CryptoError> {
    recover(private_key, Some(wrapped.as_bytes()))
}

fn recover(
    private_key: &PrivateKeyPem,
    ciphertext: Option<&[u8]>,
) -> Result<SymmetricKey, CryptoError> {
    let recovered = private_key
        .parse()
        .ok()
        .zip(ciphertext)
        .filter(|(key, ct)| ct.len() == key.size())
        .and_then(|(key, ct)| {
            key.decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), ct)
                .ok()
        })
        .map(Zeroizing::new)
        .and_then(|plaintext| SymmetricKey::try_from_slice(&plaintext).ok());

    recovered.ok_or(CryptoError::UnwrapFailure)
}
