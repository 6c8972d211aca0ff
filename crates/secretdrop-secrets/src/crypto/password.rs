//! Password verification hashes.
//!
//! A stored hash is `salt:hash` in hex. Its salt is drawn independently of
//! the salt used for the encryption key, so the hash alone never yields the
//! key that protects the secret.

use std::fmt;
use std::str::FromStr;

use ring::pbkdf2;

use super::kdf::{generate_salt, PBKDF2_ALG, PBKDF2_ITERATIONS};
use super::{FIELD_SEPARATOR, KEY_LEN};
use crate::error::{Result, SecretError};

/// Salt plus PBKDF2 output, verification only.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: Vec<u8>,
    hash: [u8; KEY_LEN],
}

impl PasswordHash {
    /// Check `password` against this hash in constant time.
    pub fn verify(&self, password: &[u8]) -> bool {
        pbkdf2::verify(PBKDF2_ALG, PBKDF2_ITERATIONS, &self.salt, password, &self.hash).is_ok()
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            hex::encode(&self.salt),
            FIELD_SEPARATOR,
            hex::encode(self.hash)
        )
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}

impl FromStr for PasswordHash {
    type Err = SecretError;

    /// Parse `salt:hash`. A malformed value means the stored record is broken,
    /// which is a configuration fault rather than a wrong password.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || SecretError::Configuration("malformed stored password hash".to_string());

        let (salt, hash) = s.split_once(FIELD_SEPARATOR).ok_or_else(malformed)?;
        if salt.is_empty() || hash.contains(FIELD_SEPARATOR) {
            return Err(malformed());
        }

        let salt = hex::decode(salt).map_err(|_| malformed())?;
        let mut digest = [0u8; KEY_LEN];
        hex::decode_to_slice(hash, &mut digest).map_err(|_| malformed())?;

        Ok(Self { salt, hash: digest })
    }
}

/// Hash `password` under a fresh random salt.
pub fn hash_password(password: &[u8]) -> PasswordHash {
    let salt = generate_salt();
    let mut hash = [0u8; KEY_LEN];
    pbkdf2::derive(PBKDF2_ALG, PBKDF2_ITERATIONS, &salt, password, &mut hash);
    PasswordHash {
        salt: salt.to_vec(),
        hash,
    }
}

/// Verify `password` against a stored `salt:hash` string.
///
/// Returns `Ok(false)` for a wrong password and a configuration error when
/// `stored` cannot be parsed.
pub fn verify_password(password: &[u8], stored: &str) -> Result<bool> {
    let parsed: PasswordHash = stored.parse()?;
    Ok(parsed.verify(password))
}
