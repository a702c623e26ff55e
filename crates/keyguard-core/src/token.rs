//! RS256-signed bearer tokens (JWT compact serialization).
//!
//! `base64url(header) . base64url(payload) . base64url(signature)`, unpadded.
//! The header is always `{"alg":"RS256","typ":"JWT"}`; the signature is
//! RSASSA-PKCS1-v1_5 with SHA-256 over the first two segments as sent.
//!
//! Every issued token carries `iat` and `exp`. Verification checks, in order:
//! structure, signature, payload shape, expiry, issuer.

use crate::config::CryptoConfig;
use crate::error::CryptoError;
use crate::keypair::{PrivateKeyPem, PublicKeyPem};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// JOSE algorithm identifier for RSASSA-PKCS1-v1_5 + SHA-256.
pub const TOKEN_ALGORITHM: &str = "RS256";

/// JOSE type header value.
pub const TOKEN_TYPE: &str = "JWT";

/// Default token lifetime: 15 minutes.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 900;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Token lifetime and issuer settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Lifetime used by [`TokenService::sign_default`], in seconds.
    pub default_ttl_secs: u64,
    /// When set, written as `iss` on signing and required on verification.
    pub issuer: Option<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            issuer: None,
        }
    }
}

impl TokenConfig {
    /// # Errors
    ///
    /// Returns `CryptoError::Config` for a zero default lifetime or an empty
    /// issuer.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.default_ttl_secs == 0 {
            return Err(CryptoError::Config(
                "default_ttl_secs must be greater than zero".into(),
            ));
        }
        if self.issuer.as_deref().is_some_and(str::is_empty) {
            return Err(CryptoError::Config("issuer must not be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Header and claims
// ---------------------------------------------------------------------------

/// JOSE header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signature algorithm.
    pub alg: String,
    /// Token type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl TokenHeader {
    fn rs256() -> Self {
        Self {
            alg: TOKEN_ALGORITHM.to_owned(),
            typ: Some(TOKEN_TYPE.to_owned()),
        }
    }
}

/// Claim set carried by a token.
///
/// `iat` and `exp` are filled in by [`TokenService::sign`]; any values the
/// caller sets there are overwritten. Everything else lives in `custom`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Expiry, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Application claims.
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl TokenClaims {
    /// Empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a custom claim, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.custom.insert(name.into(), value.into())
    }

    /// Look up a custom claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// The `sub` claim, if present and a string.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Issues and verifies RS256 tokens.
#[derive(Clone, Debug, Default)]
pub struct TokenService {
    config: TokenConfig,
}

fn unix_now() -> Result<u64, CryptoError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| CryptoError::Config("system clock is before the Unix epoch".into()))
}

fn ttl_secs_rounded_up(ttl: Duration) -> Option<u64> {
    if ttl.subsec_nanos() == 0 {
        Some(ttl.as_secs())
    } else {
        ttl.as_secs().checked_add(1)
    }
}

fn malformed(reason: &str) -> CryptoError {
    CryptoError::MalformedToken(reason.to_owned())
}

impl TokenService {
    /// # Errors
    ///
    /// Returns `CryptoError::Config` if `config` is rejected.
    pub fn new(config: TokenConfig) -> Result<Self, CryptoError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build from the `token` section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Config` if the section is rejected.
    pub fn from_config(config: &CryptoConfig) -> Result<Self, CryptoError> {
        Self::new(config.token.clone())
    }

    /// Sign `claims` with a lifetime of `ttl` from now.
    ///
    /// `exp` is whole seconds, so a fractional `ttl` rounds up: a 999 ms
    /// lifetime expires one second after issue rather than at issue.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidKeyMaterial` if the private key does not parse
    /// - `CryptoError::Signing` if the signature cannot be produced
    pub fn sign(
        &self,
        claims: &TokenClaims,
        private_key: &PrivateKeyPem,
        ttl: Duration,
    ) -> Result<String, CryptoError> {
        self.sign_at(claims, private_key, ttl, unix_now()?)
    }

    /// Sign with the configured default lifetime.
    ///
    /// # Errors
    ///
    /// Same as [`Self::sign`].
    pub fn sign_default(
        &self,
        claims: &TokenClaims,
        private_key: &PrivateKeyPem,
    ) -> Result<String, CryptoError> {
        self.sign(
            claims,
            private_key,
            Duration::from_secs(self.config.default_ttl_secs),
        )
    }

    /// Sign as if the current time were `now` (seconds since the epoch).
    ///
    /// # Errors
    ///
    /// Same as [`Self::sign`], plus `CryptoError::Signing` if `now + ttl`
    /// overflows.
    pub fn sign_at(
        &self,
        claims: &TokenClaims,
        private_key: &PrivateKeyPem,
        ttl: Duration,
        now: u64,
    ) -> Result<String, CryptoError> {
        let exp = ttl_secs_rounded_up(ttl)
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| CryptoError::Signing("expiry overflows".into()))?;

        let mut payload = claims.clone();
        payload.iat = Some(now);
        payload.exp = Some(exp);
        if let Some(issuer) = &self.config.issuer {
            payload.iss = Some(issuer.clone());
        }

        let header_json = serde_json::to_vec(&TokenHeader::rs256())
            .map_err(|e| CryptoError::Signing(format!("header encoding failed: {e}")))?;
        let payload_json = serde_json::to_vec(&payload)
            .map_err(|e| CryptoError::Signing(format!("claims encoding failed: {e}")))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(payload_json)
        );

        let signing_key = SigningKey::<Sha256>::new(private_key.parse()?);
        let signature = signing_key
            .try_sign(signing_input.as_bytes())
            .map_err(|e| CryptoError::Signing(format!("RSA signing failed: {e}")))?;

        tracing::debug!(iat = now, exp, "token signed");
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    /// Verify `token` against `public_key` at the current time.
    ///
    /// # Errors
    ///
    /// - `CryptoError::MalformedToken` for anything but three well-formed
    ///   segments with an RS256 header and a JSON payload carrying `exp`
    /// - `CryptoError::InvalidKeyMaterial` if the public key does not parse
    /// - `CryptoError::InvalidSignature` if the signature does not verify
    /// - `CryptoError::TokenExpired` if now is at or past `exp`
    /// - `CryptoError::InvalidClaims` if an issuer is configured and differs
    pub fn verify(&self, token: &str, public_key: &PublicKeyPem) -> Result<TokenClaims, CryptoError> {
        self.verify_at(token, public_key, unix_now()?)
    }

    /// Verify as if the current time were `now` (seconds since the epoch).
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify`].
    pub fn verify_at(
        &self,
        token: &str,
        public_key: &PublicKeyPem,
        now: u64,
    ) -> Result<TokenClaims, CryptoError> {
        let result = self.check(token, public_key, now);
        if let Err(e) = &result {
            tracing::debug!("token rejected: {e}");
        }
        result
    }

    fn check(
        &self,
        token: &str,
        public_key: &PublicKeyPem,
        now: u64,
    ) -> Result<TokenClaims, CryptoError> {
        // Structure.
        let (signing_input, signature_b64) = token
            .rsplit_once('.')
            .ok_or_else(|| malformed("expected three segments"))?;
        let (header_b64, payload_b64) = signing_input
            .split_once('.')
            .ok_or_else(|| malformed("expected three segments"))?;
        if payload_b64.contains('.')
            || header_b64.is_empty()
            || payload_b64.is_empty()
            || signature_b64.is_empty()
        {
            return Err(malformed("expected three non-empty segments"));
        }

        let header: TokenHeader = URL_SAFE_NO_PAD
            .decode(header_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| malformed("header is not base64url JSON"))?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(CryptoError::MalformedToken(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }
        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| malformed("signature is not base64url"))?;

        // Signature, over the segments exactly as received.
        let verifying_key = VerifyingKey::<Sha256>::new(public_key.parse()?);
        Signature::try_from(signature_bytes.as_slice())
            .ok()
            .filter(|signature| {
                verifying_key
                    .verify(signing_input.as_bytes(), signature)
                    .is_ok()
            })
            .ok_or(CryptoError::InvalidSignature)?;

        // Payload.
        let claims: TokenClaims = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| malformed("payload is not base64url JSON claims"))?;
        let exp = claims.exp.ok_or_else(|| malformed("missing exp claim"))?;

        // Temporal validity.
        if now >= exp {
            return Err(CryptoError::TokenExpired);
        }

        if let Some(expected) = &self.config.issuer {
            if claims.iss.as_ref() != Some(expected) {
                return Err(CryptoError::InvalidClaims(format!(
                    "issuer {:?} does not match {expected:?}",
                    claims.iss
                )));
            }
        }

        Ok(claims)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
