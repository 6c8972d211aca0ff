//! AES-256-GCM with a self-describing envelope.
//!
//! Wire format, all fields lowercase hex:
//!
//! ```text
//! iv:tag:ciphertext
//! ```
//!
//! The IV is 12 random bytes drawn per call; the tag is the 16-byte GCM tag.

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce, Tag};
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

use super::{FIELD_SEPARATOR, KEY_LEN};
use crate::error::{Result, SecretError};

pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// IV, authentication tag, and ciphertext, in that fixed order.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    iv: [u8; IV_LEN],
    tag: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn tag(&self) -> &[u8; TAG_LEN] {
        &self.tag
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            hex::encode(self.iv),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext),
            sep = FIELD_SEPARATOR
        )
    }
}

// Ciphertext is not sensitive, but it is noise in logs.
impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

impl FromStr for Envelope {
    type Err = SecretError;

    /// Parse `iv:tag:ciphertext`. Any structural problem is a decryption failure.
    fn from_str(s: &str) -> Result<Self> {
        let mut fields = s.split(FIELD_SEPARATOR);
        let (Some(iv), Some(tag), Some(ciphertext), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(SecretError::Decryption);
        };

        Ok(Self {
            iv: decode_fixed(iv)?,
            tag: decode_fixed(tag)?,
            ciphertext: hex::decode(ciphertext).map_err(|_| SecretError::Decryption)?,
        })
    }
}

fn decode_fixed<const N: usize>(field: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(field, &mut out).map_err(|_| SecretError::Decryption)?;
    Ok(out)
}

/// An AES-256-GCM cipher bound to one 32-byte key.
pub struct SymmetricCipher {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl SymmetricCipher {
    /// Build a cipher. Any key length other than 32 bytes is rejected here,
    /// before the cipher is ever used.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(SecretError::Configuration(format!(
                "cipher key must be {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        bytes.copy_from_slice(key);
        Ok(Self { key: bytes })
    }

    fn aead(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key[..]))
    }

    /// Encrypt `plaintext` under a fresh random IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Envelope> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let mut buffer = plaintext.to_vec();
        let tag = self
            .aead()
            .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| SecretError::Configuration("plaintext too large to encrypt".to_string()))?;

        let mut tag_bytes = [0u8; TAG_LEN];
        tag_bytes.copy_from_slice(&tag);

        Ok(Envelope {
            iv,
            tag: tag_bytes,
            ciphertext: buffer,
        })
    }

    /// Decrypt and authenticate an envelope.
    pub fn decrypt(&self, envelope: &Envelope) -> Result<Zeroizing<Vec<u8>>> {
        let mut buffer = Zeroizing::new(envelope.ciphertext.clone());
        self.aead()
            .decrypt_in_place_detached(
                Nonce::from_slice(&envelope.iv),
                b"",
                &mut buffer,
                Tag::from_slice(&envelope.tag),
            )
            .map_err(|_| {
                debug!("envelope failed authentication");
                SecretError::Decryption
            })?;
        Ok(buffer)
    }
}

impl fmt::Debug for SymmetricCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricCipher([REDACTED])")
    }
}
