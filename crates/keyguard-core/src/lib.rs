//! `keyguard-core`: cryptographic building blocks for authentication services.
//!
//! Argon2id password records, AES-256-GCM payloads, RSA key pairs, RSA-OAEP
//! key wrapping, RS256 bearer tokens and SHA-256 integrity baselines. Every
//! component is stateless after construction and safe to share across threads. The slow operations also
//! have `spawn_*` variants that run on Tokio's blocking pool.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod compare;
pub mod integrity;
pub mod random;

pub mod config;
pub mod task;

pub mod password;
pub mod symmetric;

pub mod keypair;
pub mod keywrap;

pub mod token;

pub use compare::constant_time_eq;
pub use config::CryptoConfig;
pub use error::CryptoError;
pub use integrity::IntegrityBaseline;
pub use keypair::{KeyPair, KeyPairGenerator, PrivateKeyPem, PublicKeyPem, RsaConfig};
pub use keywrap::{unwrap, unwrap_key, wrap, wrap_key, WrappedKey};
pub use memory::{SecretBuffer, SymmetricKey, SYMMETRIC_KEY_LEN};
pub use password::{Argon2idParams, PasswordHashRecord, PasswordHasher};
pub use symmetric::{decrypt, encrypt, EncryptedPayload};
pub use task::BackgroundTask;
pub use token::{TokenClaims, TokenConfig, TokenService};
