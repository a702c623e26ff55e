//! Operating-system CSPRNG access.
//!
//! Every nonce, salt, and generated key in this crate comes from here.
//! `OsRng` is stateless, so these functions are safe to call from any
//! number of threads without synchronization.

use crate::error::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;

/// Fill `buf` with bytes from the OS CSPRNG.
///
/// # Errors
///
/// Returns `CryptoError::EntropyUnavailable` if the OS generator fails.
pub fn fill(buf: &mut [u8]) -> Result<(), CryptoError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::EntropyUnavailable(format!("OS CSPRNG fill failed: {e}")))
}

/// Return `n` bytes from the OS CSPRNG.
///
/// # Errors
///
/// Returns `CryptoError::EntropyUnavailable` if the OS generator fails.
pub fn generate(n: usize) -> Result<Vec<u8>, CryptoError> {
    let mut bytes = vec![0u8; n];
    fill(&mut bytes)?;
    Ok(bytes)
}

/// Return a fixed-size array from the OS CSPRNG.
///
/// # Errors
///
/// Returns `CryptoError::EntropyUnavailable` if the OS generator fails.
pub fn generate_array<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    fill(&mut bytes)?;
    Ok(bytes)
}
