//! Zeroizing containers for key material and recovered plaintext.
//!
//! - [`SecretBuffer`]: variable-length, returned by decryption
//! - [`SymmetricKey`]: exactly 32 bytes, the AES-256 / wrapped key type
//!
//! Both zero their memory on drop and mask `Debug`/`Display` output so a
//! stray log line cannot leak their contents.

use crate::error::CryptoError;
use crate::random;
use secrecy::{ExposeSecret, SecretSlice};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key length in bytes (256 bits).
pub const SYMMETRIC_KEY_LEN: usize = 32;

// ---------------------------------------------------------------------------
// SecretBuffer
// ---------------------------------------------------------------------------

/// Variable-length buffer for sensitive data, zeroized on drop.
pub struct SecretBuffer {
    inner: SecretSlice<u8>,
}

impl SecretBuffer {
    /// Copy `data` into a new secret allocation.
    ///
    /// The caller should zeroize the source after calling this.
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        Self {
            inner: data.to_vec().into(),
        }
    }

    /// Expose the underlying bytes. Keep the borrow short.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    /// Number of bytes in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Returns `true` if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for SecretBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { inner: data.into() }
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

impl fmt::Display for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

// ---------------------------------------------------------------------------
// SymmetricKey
// ---------------------------------------------------------------------------

/// A 256-bit symmetric key.
///
/// The length invariant is enforced by the type: the only ways to obtain one
/// are [`SymmetricKey::generate`], [`SymmetricKey::from_bytes`], and
/// [`SymmetricKey::try_from_slice`] (which checks the length).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; SYMMETRIC_KEY_LEN],
}

impl SymmetricKey {
    /// Wrap an existing 32-byte array.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SYMMETRIC_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Copy a slice into a key, rejecting anything but 32 bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` if `bytes.len() != 32`.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; SYMMETRIC_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: SYMMETRIC_KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self { bytes: arr })
    }

    /// Generate a fresh random key from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EntropyUnavailable` if the CSPRNG fails.
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self {
            bytes: random::generate_array()?,
        })
    }

    /// Expose the raw key bytes for a cryptographic operation.
    #[must_use]
    pub const fn expose(&self) -> &[u8; SYMMETRIC_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(***)")
    }
}

impl fmt::Display for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(***)")
    }
}
