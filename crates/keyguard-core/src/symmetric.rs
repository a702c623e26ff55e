//! AES-256-GCM authenticated encryption.
//!
//! This module provides:
//! - [`encrypt`]: encrypt with a fresh random nonce, returning [`EncryptedPayload`]
//! - [`decrypt`]: decode, authenticate and decrypt an encoded payload
//! - [`encrypt_with_aad`] / [`decrypt_with_aad`]: same, binding extra context
//! - [`EncryptedPayload`]: nonce + tag + ciphertext container
//!
//! # Wire format
//!
//! Standard base64 of `nonce (12 bytes) || tag (16 bytes) || ciphertext`.
//! The byte order and tag length are fixed for interoperability.

use crate::error::CryptoError;
use crate::memory::{SecretBuffer, SYMMETRIC_KEY_LEN};
use crate::random;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ring::aead;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

/// AES-256-GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// AES-256-GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// AES-256-GCM key length in bytes (256 bits).
pub const KEY_LEN: usize = SYMMETRIC_KEY_LEN;

/// Minimum decoded payload length: nonce + tag + empty ciphertext.
pub const MIN_PAYLOAD_LEN: usize = NONCE_LEN + TAG_LEN;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Authenticated ciphertext: nonce, tag, and ciphertext.
///
/// Any modification to any of the three parts makes decryption fail.
#[must_use = "encrypted data must be stored or transmitted"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedPayload {
    /// 96-bit random nonce, unique per encryption.
    pub nonce: [u8; NONCE_LEN],
    /// 128-bit authentication tag.
    pub tag: [u8; TAG_LEN],
    /// Encrypted data (same length as the plaintext).
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Raw wire bytes: `nonce || tag || ciphertext`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let capacity = MIN_PAYLOAD_LEN.saturating_add(self.ciphertext.len());
        let mut out = Vec::with_capacity(capacity);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split raw wire bytes into nonce, tag, and ciphertext.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MalformedPayload` if `bytes` is shorter than 28.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_PAYLOAD_LEN {
            return Err(CryptoError::MalformedPayload(format!(
                "payload too short: {} bytes (minimum {MIN_PAYLOAD_LEN})",
                bytes.len()
            )));
        }
        let (nonce, rest) = bytes.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut payload = Self {
            nonce: [0u8; NONCE_LEN],
            tag: [0u8; TAG_LEN],
            ciphertext: ciphertext.to_vec(),
        };
        payload.nonce.copy_from_slice(nonce);
        payload.tag.copy_from_slice(tag);
        Ok(payload)
    }

    /// Base64 text form.
    #[must_use]
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Parse the base64 text form.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MalformedPayload` for invalid base64 or a decoded
    /// length below 28 bytes.
    pub fn decode(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::MalformedPayload(format!("invalid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for EncryptedPayload {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for EncryptedPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for EncryptedPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Core encryption
// ---------------------------------------------------------------------------

fn aes_key(key: &[u8]) -> Result<aead::LessSafeKey, CryptoError> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, key)
        .map_err(|_| CryptoError::Encryption("failed to create AES-256-GCM key".into()))?;
    Ok(aead::LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under a 32-byte key.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyLength` unless `key` is 32 bytes, or
/// `CryptoError::EntropyUnavailable` if no nonce can be drawn.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<EncryptedPayload, CryptoError> {
    encrypt_with_aad(plaintext, key, &[])
}

/// Encrypt `plaintext`, additionally authenticating `aad`.
///
/// `aad` is not encrypted and not included in the payload; the same bytes
/// must be supplied to [`decrypt_with_aad`].
///
/// # Errors
///
/// Same as [`encrypt`].
pub fn encrypt_with_aad(
    plaintext: &[u8],
    key: &[u8],
    aad: &[u8],
) -> Result<EncryptedPayload, CryptoError> {
    let cipher = aes_key(key)?;

    let nonce_bytes: [u8; NONCE_LEN] = random::generate_array()?;
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    // Encrypt in place; the buffer becomes ciphertext.
    let mut in_out = plaintext.to_vec();
    let Ok(tag) = cipher.seal_in_place_separate_tag(nonce, aead::Aad::from(aad), &mut in_out)
    else {
        in_out.zeroize();
        return Err(CryptoError::Encryption(
            "AES-256-GCM encryption failed".into(),
        ));
    };

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_ref());
    tracing::debug!(len = in_out.len(), aad_len = aad.len(), "payload encrypted");

    Ok(EncryptedPayload {
        nonce: nonce_bytes,
        tag: tag_bytes,
        ciphertext: in_out,
    })
}

/// Decrypt an encoded payload under a 32-byte key.
///
/// # Errors
///
/// - `CryptoError::InvalidKeyLength` unless `key` is 32 bytes
/// - `CryptoError::MalformedPayload` for bad base64 or fewer than 28 bytes
/// - `CryptoError::AuthenticationFailure` if the tag does not verify
pub fn decrypt(payload: &str, key: &[u8]) -> Result<SecretBuffer, CryptoError> {
    decrypt_with_aad(payload, key, &[])
}

/// Decrypt an encoded payload that was sealed with `aad`.
///
/// # Errors
///
/// Same as [`decrypt`]; an `aad` mismatch is an authentication failure.
pub fn decrypt_with_aad(payload: &str, key: &[u8], aad: &[u8]) -> Result<SecretBuffer, CryptoError> {
    let cipher = aes_key(key)?;
    let payload = EncryptedPayload::decode(payload)?;
    open(&cipher, &payload, aad)
}

/// Decrypt an already decoded payload.
///
/// # Errors
///
/// Same as [`decrypt_with_aad`], minus the decoding errors.
pub fn decrypt_payload(
    payload: &EncryptedPayload,
    key: &[u8],
    aad: &[u8],
) -> Result<SecretBuffer, CryptoError> {
    let cipher = aes_key(key)?;
    open(&cipher, payload, aad)
}

/// Authenticate then decrypt. Plaintext leaves this function only when the
/// tag verified; the working buffer is zeroized on every path.
fn open(
    cipher: &aead::LessSafeKey,
    payload: &EncryptedPayload,
    aad: &[u8],
) -> Result<SecretBuffer, CryptoError> {
    let nonce = aead::Nonce::assume_unique_for_key(payload.nonce);

    // ring expects ciphertext || tag.
    let mut ct_tag = Vec::with_capacity(payload.ciphertext.len().saturating_add(TAG_LEN));
    ct_tag.extend_from_slice(&payload.ciphertext);
    ct_tag.extend_from_slice(&payload.tag);

    let opened = cipher
        .open_in_place(nonce, aead::Aad::from(aad), &mut ct_tag)
        .map(|data| SecretBuffer::new(data));
    ct_tag.zeroize();
    opened.map_err(|_| CryptoError::AuthenticationFailure)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
