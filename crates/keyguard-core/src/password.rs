//! Argon2id password hashing and verification.
//!
//! This module provides:
//! - [`PasswordHasher`]: hashes passwords with a fixed, configured cost
//! - [`PasswordHashRecord`]: self-describing record (PHC string on the wire)
//! - [`Argon2idParams`]: cost parameters, part of [`crate::CryptoConfig`]
//!
//! # Record format
//!
//! `$argon2id$v=19$m=131072,t=3,p=1$<salt>$<digest>` where salt and digest are
//! unpadded standard base64. Verification reads every parameter back out of
//! the record, so raising the configured cost never invalidates stored
//! records; [`PasswordHasher::needs_rehash`] tells the caller when to upgrade.

use crate::compare::constant_time_eq;
use crate::config::CryptoConfig;
use crate::error::CryptoError;
use crate::random;
use crate::task::BackgroundTask;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// PHC identifier for Argon2id.
pub const ARGON2ID_IDENT: &str = "argon2id";

/// Argon2 version 1.3 (0x13), the only version new records are written with.
pub const ARGON2_VERSION: u32 = 0x13;

/// Argon2 version 1.0 (0x10), still accepted when verifying.
const ARGON2_VERSION_LEGACY: u32 = 0x10;

/// 128 MiB in KiB.
const MEMORY_128MIB: u32 = 131_072;

/// Minimum salt length in bytes.
pub const MIN_SALT_LEN: usize = 16;

/// Longest salt that still fits a PHC salt field (64 base64 characters).
const MAX_SALT_LEN: usize = 48;

/// Digest length bounds accepted by the PHC output field.
const MIN_OUTPUT_LEN: usize = 16;
const MAX_OUTPUT_LEN: usize = 64;

/// Highest memory cost a record may carry: 512 MiB in KiB, four times the default.
pub const MAX_M_COST: u32 = 524_288;

/// Highest time cost a record may carry.
pub const MAX_T_COST: u32 = 16;

/// Highest parallelism a record may carry.
pub const MAX_P_COST: u32 = 16;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Argon2id cost parameters.
///
/// Fields use the `argon2` crate convention:
/// - `m_cost`: memory in KiB
/// - `t_cost`: number of passes
/// - `p_cost`: degree of parallelism
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Argon2idParams {
    /// Memory cost in KiB. Default 2^17 (128 MiB).
    pub m_cost: u32,
    /// Time cost (passes). Default 3.
    pub t_cost: u32,
    /// Parallelism (lanes). Default 1.
    pub p_cost: u32,
    /// Salt length in bytes. Default 16.
    pub salt_len: usize,
    /// Digest length in bytes. Default 32.
    pub output_len: usize,
}

impl Default for Argon2idParams {
    fn default() -> Self {
        Self {
            m_cost: MEMORY_128MIB,
            t_cost: 3,
            p_cost: 1,
            salt_len: MIN_SALT_LEN,
            output_len: 32,
        }
    }
}

impl Argon2idParams {
    /// Check the parameters against what Argon2id and the record format accept.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Config` describing the first rejected field.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.salt_len < MIN_SALT_LEN || self.salt_len > MAX_SALT_LEN {
            return Err(CryptoError::Config(format!(
                "salt_len {} outside {MIN_SALT_LEN}..={MAX_SALT_LEN}",
                self.salt_len
            )));
        }
        if self.output_len < MIN_OUTPUT_LEN || self.output_len > MAX_OUTPUT_LEN {
            return Err(CryptoError::Config(format!(
                "output_len {} outside {MIN_OUTPUT_LEN}..={MAX_OUTPUT_LEN}",
                self.output_len
            )));
        }
        check_cost_ceiling(self.m_cost, self.t_cost, self.p_cost).map_err(CryptoError::Config)?;
        argon2_params(self.m_cost, self.t_cost, self.p_cost, self.output_len)
            .map(|_| ())
            .map_err(|e| CryptoError::Config(format!("invalid argon2 params: {e}")))
    }
}

/// Costs above the ceiling are refused before any memory is allocated, so a
/// stored record cannot make verification exhaust memory or stall a thread.
fn check_cost_ceiling(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<(), String> {
    if m_cost > MAX_M_COST {
        return Err(format!("m_cost {m_cost} above {MAX_M_COST}"));
    }
    if t_cost > MAX_T_COST {
        return Err(format!("t_cost {t_cost} above {MAX_T_COST}"));
    }
    if p_cost > MAX_P_COST {
        return Err(format!("p_cost {p_cost} above {MAX_P_COST}"));
    }
    Ok(())
}

fn argon2_params(
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
    output_len: usize,
) -> Result<argon2::Params, argon2::Error> {
    argon2::Params::new(m_cost, t_cost, p_cost, Some(output_len))
}

/// Run Argon2id with explicit parameters. Output is zeroized on drop.
fn derive(
    password: &[u8],
    salt: &[u8],
    version: u32,
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let version = argon2::Version::try_from(version)
        .map_err(|e| CryptoError::UnsupportedAlgorithm(format!("argon2 version: {e}")))?;
    let params = argon2_params(m_cost, t_cost, p_cost, output_len)
        .map_err(|e| CryptoError::KeyDerivation(format!("invalid argon2 params: {e}")))?;
    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, version, params);

    let mut output = Zeroizing::new(vec![0u8; output_len]);
    argon2
        .hash_password_into(password, salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(format!("argon2id derivation failed: {e}")))?;
    Ok(output)
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A stored password hash.
///
/// Tagged by algorithm so a future scheme can be added as a new variant
/// without changing how existing records parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PasswordHashRecord {
    /// Argon2id with the parameters the digest was produced under.
    Argon2id {
        /// Argon2 version (0x13 for new records).
        version: u32,
        /// Memory cost in KiB.
        m_cost: u32,
        /// Time cost.
        t_cost: u32,
        /// Parallelism.
        p_cost: u32,
        /// Random salt.
        salt: Vec<u8>,
        /// Argon2id output.
        digest: Vec<u8>,
    },
}

impl PasswordHashRecord {
    /// Recompute the digest for `password` under this record's parameters and
    /// compare in constant time.
    ///
    /// # Errors
    ///
    /// Returns an error only if derivation itself cannot run (bad embedded
    /// parameters, allocation failure). A wrong password is `Ok(false)`.
    pub fn matches(&self, password: &[u8]) -> Result<bool, CryptoError> {
        match self {
            Self::Argon2id {
                version,
                m_cost,
                t_cost,
                p_cost,
                salt,
                digest,
            } => {
                check_cost_ceiling(*m_cost, *t_cost, *p_cost)
                    .map_err(CryptoError::MalformedRecord)?;
                let candidate = derive(
                    password,
                    salt,
                    *version,
                    *m_cost,
                    *t_cost,
                    *p_cost,
                    digest.len(),
                )?;
                Ok(constant_time_eq(&candidate, digest))
            }
        }
    }

    /// Encode as a PHC string.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PasswordHashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argon2id {
                version,
                m_cost,
                t_cost,
                p_cost,
                salt,
                digest,
            } => write!(
                f,
                "${ARGON2ID_IDENT}$v={version}$m={m_cost},t={t_cost},p={p_cost}${}${}",
                STANDARD_NO_PAD.encode(salt),
                STANDARD_NO_PAD.encode(digest),
            ),
        }
    }
}

impl FromStr for PasswordHashRecord {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use argon2::password_hash::PasswordHash;

        let phc = PasswordHash::new(s)
            .map_err(|e| CryptoError::MalformedRecord(format!("not a PHC string: {e}")))?;

        if phc.algorithm.as_str() != ARGON2ID_IDENT {
            return Err(CryptoError::UnsupportedAlgorithm(
                phc.algorithm.as_str().to_owned(),
            ));
        }

        let version = phc.version.unwrap_or(ARGON2_VERSION);
        if version != ARGON2_VERSION && version != ARGON2_VERSION_LEGACY {
            return Err(CryptoError::UnsupportedAlgorithm(format!(
                "{ARGON2ID_IDENT} version {version}"
            )));
        }

        let params = argon2::Params::try_from(&phc)
            .map_err(|e| CryptoError::MalformedRecord(format!("bad parameters: {e}")))?;
        check_cost_ceiling(params.m_cost(), params.t_cost(), params.p_cost())
            .map_err(CryptoError::MalformedRecord)?;

        let salt = phc
            .salt
            .ok_or_else(|| CryptoError::MalformedRecord("missing salt".into()))
            .and_then(|salt| {
                STANDARD_NO_PAD
                    .decode(salt.as_str())
                    .map_err(|e| CryptoError::MalformedRecord(format!("bad salt encoding: {e}")))
            })?;
        if salt.len() < MIN_SALT_LEN {
            return Err(CryptoError::MalformedRecord(format!(
                "salt too short: {} bytes (minimum {MIN_SALT_LEN})",
                salt.len()
            )));
        }

        let digest = phc
            .hash
            .map(|output| output.as_bytes().to_vec())
            .ok_or_else(|| CryptoError::MalformedRecord("missing digest".into()))?;

        Ok(Self::Argon2id {
            version,
            m_cost: params.m_cost(),
            t_cost: params.t_cost(),
            p_cost: params.p_cost(),
            salt,
            digest,
        })
    }
}

impl Serialize for PasswordHashRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PasswordHashRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Hasher
// ---------------------------------------------------------------------------

/// Hashes passwords with Argon2id under a fixed parameter set.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Argon2idParams,
}

impl PasswordHasher {
    /// Build a hasher with explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Config` if the parameters are rejected.
    pub fn new(params: Argon2idParams) -> Result<Self, CryptoError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Build a hasher from the `password` section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Config` if the parameters are rejected.
    pub fn from_config(config: &CryptoConfig) -> Result<Self, CryptoError> {
        Self::new(config.password.clone())
    }

    /// Parameters new records are produced with.
    #[must_use]
    pub const fn params(&self) -> &Argon2idParams {
        &self.params
    }

    /// Hash `password` with a fresh random salt.
    ///
    /// Deliberately slow. From async code prefer [`Self::spawn_hash`].
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EntropyUnavailable` if no salt can be drawn, or
    /// `CryptoError::KeyDerivation` if Argon2id fails (e.g. allocation).
    pub fn hash(&self, password: &[u8]) -> Result<PasswordHashRecord, CryptoError> {
        let p = &self.params;
        let salt = random::generate(p.salt_len)?;
        let digest = derive(
            password,
            &salt,
            ARGON2_VERSION,
            p.m_cost,
            p.t_cost,
            p.p_cost,
            p.output_len,
        )?;
        tracing::debug!(
            m_cost = p.m_cost,
            t_cost = p.t_cost,
            p_cost = p.p_cost,
            "password hashed"
        );
        Ok(PasswordHashRecord::Argon2id {
            version: ARGON2_VERSION,
            m_cost: p.m_cost,
            t_cost: p.t_cost,
            p_cost: p.p_cost,
            salt,
            digest: digest.to_vec(),
        })
    }

    /// Check `password` against an encoded record.
    ///
    /// Returns `false` for a wrong password, a malformed record, an
    /// unsupported algorithm, costs above [`MAX_M_COST`]/[`MAX_T_COST`]/
    /// [`MAX_P_COST`], or a derivation failure. Never errors.
    #[must_use]
    pub fn verify(record: &str, password: &[u8]) -> bool {
        let outcome = record
            .parse::<PasswordHashRecord>()
            .and_then(|parsed| parsed.matches(password));
        matches!(outcome, Ok(true))
    }

    /// Check `password` against an already parsed record.
    #[must_use]
    pub fn verify_record(record: &PasswordHashRecord, password: &[u8]) -> bool {
        matches!(record.matches(password), Ok(true))
    }

    /// Whether `record` was produced under different parameters than this
    /// hasher uses now (or cannot be parsed at all).
    #[must_use]
    pub fn needs_rehash(&self, record: &str) -> bool {
        let p = &self.params;
        match record.parse::<PasswordHashRecord>() {
            Ok(PasswordHashRecord::Argon2id {
                version,
                m_cost,
                t_cost,
                p_cost,
                salt,
                digest,
            }) => {
                version != ARGON2_VERSION
                    || m_cost != p.m_cost
                    || t_cost != p.t_cost
                    || p_cost != p.p_cost
                    || salt.len() < p.salt_len
                    || digest.len() != p.output_len
            }
            Err(_) => true,
        }
    }

    /// Hash on the blocking worker pool.
    ///
    /// Dropping or cancelling the returned task discards the result; the
    /// password copy owned by the worker is zeroized either way.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Task` if called outside a Tokio runtime.
    pub fn spawn_hash(
        &self,
        password: SecretString,
    ) -> Result<BackgroundTask<PasswordHashRecord>, CryptoError> {
        let hasher = self.clone();
        BackgroundTask::spawn("password_hash", move || {
            hasher.hash(password.expose_secret().as_bytes())
        })
    }

    /// Verify on the blocking worker pool. Resolves to `Ok(bool)` unless the
    /// task itself is cancelled or panics.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Task` if called outside a Tokio runtime.
    pub fn spawn_verify(
        record: String,
        password: SecretString,
    ) -> Result<BackgroundTask<bool>, CryptoError> {
        BackgroundTask::spawn("password_verify", move || {
            Ok(Self::verify(&record, password.expose_secret().as_bytes()))
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
