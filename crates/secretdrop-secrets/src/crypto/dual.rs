//! Two independent AEAD layers.
//!
//! The inner layer is keyed by a password-derived key and serialized as
//! `salt:iv:tag:ciphertext`. That whole string is then encrypted under the
//! system key, producing the outer `iv:tag:ciphertext` that gets stored.
//! A leaked snapshot needs the system key; a leaked system key still needs
//! each password.

use zeroize::Zeroizing;

use super::cipher::{Envelope, SymmetricCipher};
use super::kdf::{derive_key, generate_salt, SALT_LEN};
use super::password::{hash_password, PasswordHash};
use super::FIELD_SEPARATOR;
use crate::error::{Result, SecretError};
use crate::system_key::SystemKey;

/// Output of [`encrypt_dual`].
#[derive(Debug, Clone)]
pub struct DualCiphertext {
    /// System-layer envelope wrapping the password layer.
    pub envelope: Envelope,
    /// Independently salted verification hash of the password.
    pub password_hash: PasswordHash,
}

/// Encrypt `plaintext` under `password`, then under `system_key`.
pub fn encrypt_dual(
    plaintext: &[u8],
    password: &[u8],
    system_key: &SystemKey,
) -> Result<DualCiphertext> {
    let salt = generate_salt();
    let inner = {
        let key = derive_key(password, &salt);
        SymmetricCipher::new(key.as_bytes())?.encrypt(plaintext)?
    };

    let password_layer = format!("{}{}{}", hex::encode(salt), FIELD_SEPARATOR, inner);
    let envelope = SymmetricCipher::new(system_key.as_bytes())?.encrypt(password_layer.as_bytes())?;

    Ok(DualCiphertext {
        envelope,
        password_hash: hash_password(password),
    })
}

/// Reverse [`encrypt_dual`].
///
/// A failure at either layer is the same [`SecretError::Decryption`]; the
/// caller tells a wrong password apart beforehand with the password hash.
pub fn decrypt_dual(
    envelope: &Envelope,
    password: &[u8],
    system_key: &SystemKey,
) -> Result<Zeroizing<Vec<u8>>> {
    let password_layer = SymmetricCipher::new(system_key.as_bytes())?.decrypt(envelope)?;
    let password_layer = std::str::from_utf8(&password_layer).map_err(|_| SecretError::Decryption)?;

    let (salt_hex, inner) = password_layer
        .split_once(FIELD_SEPARATOR)
        .ok_or(SecretError::Decryption)?;
    let mut salt = [0u8; SALT_LEN];
    hex::decode_to_slice(salt_hex, &mut salt).map_err(|_| SecretError::Decryption)?;
    let inner: Envelope = inner.parse()?;

    let key = derive_key(password, &salt);
    SymmetricCipher::new(key.as_bytes())?.decrypt(&inner)
}
