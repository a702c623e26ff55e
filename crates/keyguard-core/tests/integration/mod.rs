use keyguard_core::keypair::{KeyPair, KeyPairGenerator, MIN_MODULUS_BITS};
use keyguard_core::password::Argon2idParams;
use std::sync::OnceLock;

mod background_tasks;
mod keywrap_roundtrip;
mod password_roundtrip;

/// One 2048-bit pair for the whole test binary.
pub(crate) fn key_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| {
        KeyPairGenerator::default()
            .generate(MIN_MODULUS_BITS)
            .expect("2048-bit generation should succeed")
    })
}

/// 64 KiB, one pass, one lane.
pub(crate) fn fast_params() -> Argon2idParams {
    Argon2idParams {
        m_cost: 64,
        t_cost: 1,
        p_cost: 1,
        ..Argon2idParams::default()
    }
}
