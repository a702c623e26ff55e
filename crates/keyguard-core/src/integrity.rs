//! Content integrity checks against a baseline of SHA-256 digests.
//!
//! A baseline maps a name (typically a file path) to the digest its content
//! had when it was known good. Checking recomputes the digest and compares it
//! in constant time. Reading the content is left to the caller; [`sha256_reader`]
//! streams any [`Read`] source.

use crate::compare::constant_time_eq;
use crate::error::CryptoError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Read;

/// SHA-256 digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// SHA-256 of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(data).into()
}

/// Lowercase hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// SHA-256 of everything `reader` yields.
///
/// # Errors
///
/// Returns `CryptoError::MalformedPayload` if the reader fails.
pub fn sha256_reader<R: Read>(mut reader: R) -> Result<[u8; DIGEST_LEN], CryptoError> {
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader
            .read(&mut chunk)
            .map_err(|e| CryptoError::MalformedPayload(format!("read failed: {e}")))?;
        let Some(filled) = chunk.get(..n) else {
            return Err(CryptoError::MalformedPayload("reader overran its buffer".into()));
        };
        if filled.is_empty() {
            break;
        }
        hasher.update(filled);
    }
    Ok(hasher.finalize().into())
}

/// Whether `data` hashes to `expected`. A digest of the wrong length never matches.
#[must_use]
pub fn matches_digest(data: &[u8], expected: &[u8]) -> bool {
    constant_time_eq(&sha256(data), expected)
}

/// Known-good digests keyed by name.
///
/// Serializes as a JSON object of name to lowercase hex digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct IntegrityBaseline {
    digests: BTreeMap<String, [u8; DIGEST_LEN]>,
}

impl IntegrityBaseline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the digest of `data` under `name`, replacing any earlier entry.
    pub fn record(&mut self, name: impl Into<String>, data: &[u8]) {
        self.digests.insert(name.into(), sha256(data));
    }

    /// Record a digest given as hex.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MalformedRecord` unless `digest_hex` is 64 hex digits.
    pub fn insert_hex(
        &mut self,
        name: impl Into<String>,
        digest_hex: &str,
    ) -> Result<(), CryptoError> {
        self.digests.insert(name.into(), decode_digest(digest_hex)?);
        Ok(())
    }

    /// The stored digest for `name`, if any.
    #[must_use]
    pub fn digest(&self, name: &str) -> Option<&[u8; DIGEST_LEN]> {
        self.digests.get(name)
    }

    /// Whether `data` still matches the digest recorded for `name`.
    ///
    /// An unknown name never matches.
    #[must_use]
    pub fn check(&self, name: &str, data: &[u8]) -> bool {
        let verdict = self
            .digests
            .get(name)
            .is_some_and(|expected| matches_digest(data, expected));
        if !verdict {
            tracing::warn!(name, "integrity check failed");
        }
        verdict
    }

    /// Streaming form of [`Self::check`].
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MalformedPayload` if the reader fails.
    pub fn check_reader<R: Read>(&self, name: &str, reader: R) -> Result<bool, CryptoError> {
        let Some(expected) = self.digests.get(name) else {
            tracing::warn!(name, "no baseline digest recorded");
            return Ok(false);
        };
        Ok(constant_time_eq(&sha256_reader(reader)?, expected))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

fn decode_digest(digest_hex: &str) -> Result<[u8; DIGEST_LEN], CryptoError> {
    let bytes = hex::decode(digest_hex)
        .map_err(|e| CryptoError::MalformedRecord(format!("digest is not hex: {e}")))?;
    <[u8; DIGEST_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        CryptoError::MalformedRecord(format!(
            "digest must be {DIGEST_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

impl TryFrom<BTreeMap<String, String>> for IntegrityBaseline {
    type Error = CryptoError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let digests = map
            .into_iter()
            .map(|(name, digest_hex)| decode_digest(&digest_hex).map(|d| (name, d)))
            .collect::<Result<_, _>>()?;
        Ok(Self { digests })
    }
}

impl From<IntegrityBaseline> for BTreeMap<String, String> {
    fn from(baseline: IntegrityBaseline) -> Self {
        baseline
            .digests
            .into_iter()
            .map(|(name, digest)| (name, hex::encode(digest)))
            .collect()
    }
}
