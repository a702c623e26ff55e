//! Cryptographic error types for `keyguard-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
///
/// Password verification is the one operation that never surfaces an error:
/// every failure there collapses into `false`.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The operating system CSPRNG could not be read. Fatal; never retried
    /// with a weaker source.
    #[error("secure randomness unavailable: {0}")]
    EntropyUnavailable(String),

    /// Symmetric key is not exactly the required length.
    #[error("invalid key length: {actual} bytes (expected {expected})")]
    InvalidKeyLength {
        /// Required length in bytes.
        expected: usize,
        /// Length supplied by the caller.
        actual: usize,
    },

    /// Requested RSA modulus size is outside the accepted range.
    #[error("unsupported RSA modulus size: {requested} bits (accepted {minimum}..={maximum}, multiple of 8)")]
    UnsupportedModulusSize {
        /// Requested size in bits.
        requested: usize,
        /// Smallest accepted size in bits.
        minimum: usize,
        /// Largest accepted size in bits.
        maximum: usize,
    },

    /// Encrypted payload is not valid base64 or is shorter than nonce + tag.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Token does not have three well-formed segments or carries bad JSON.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Password hash record is not a well-formed PHC string.
    #[error("malformed password hash record: {0}")]
    MalformedRecord(String),

    /// Password hash record names an algorithm or version we do not verify.
    #[error("unsupported password hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// AES-256-GCM tag verification failed: tampered data or wrong key.
    #[error("decryption failed: authentication tag mismatch")]
    AuthenticationFailure,

    /// Key unwrap failed. Carries no detail about the failing step.
    #[error("key unwrap failed")]
    UnwrapFailure,

    /// Token signature did not verify under the supplied public key.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Token lifetime has elapsed.
    #[error("token has expired")]
    TokenExpired,

    /// Token is authentic but its claims are unacceptable (issuer mismatch).
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),

    /// Key material could not be parsed (PEM/DER decoding).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Argon2id derivation failed (parameter validation, memory allocation).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption-side failure that is not a caller input error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// RSA key pair generation or encoding failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Token signature could not be produced.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Configuration rejected at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Background worker could not be scheduled or panicked.
    #[error("background task failed: {0}")]
    Task(String),

    /// Background work was cancelled before producing a result.
    #[error("background task cancelled")]
    Cancelled,
}
