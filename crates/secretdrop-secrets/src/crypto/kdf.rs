//! Password-based key derivation (PBKDF2-HMAC-SHA256).

use std::num::NonZeroU32;

use rand::RngCore;
use ring::pbkdf2;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::KEY_LEN;

/// Length of every KDF salt, in bytes.
pub const SALT_LEN: usize = 32;

/// Fixed stretch factor. Changing it invalidates every stored record.
pub const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

pub(crate) static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// 32-byte key derived from a password. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Stretch `password` with `salt` into a 256-bit key.
///
/// Deterministic: the same inputs always yield the same key.
pub fn derive_key(password: &[u8], salt: &[u8]) -> DerivedKey {
    let mut out = [0u8; KEY_LEN];
    pbkdf2::derive(PBKDF2_ALG, PBKDF2_ITERATIONS, salt, password, &mut out);
    DerivedKey(out)
}

/// Generate a fresh random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
