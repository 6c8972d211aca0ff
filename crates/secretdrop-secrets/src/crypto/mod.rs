//! Cryptographic building blocks.
//!
//! - [`kdf`]: PBKDF2-HMAC-SHA256 key stretching
//! - [`cipher`]: AES-256-GCM envelopes
//! - [`password`]: salted verification hashes, compared in constant time
//! - [`dual`]: the password layer wrapped in the system layer

pub mod cipher;
pub mod dual;
pub mod kdf;
pub mod password;

pub use cipher::{Envelope, SymmetricCipher};
pub use dual::{decrypt_dual, encrypt_dual, DualCiphertext};
pub use kdf::{derive_key, generate_salt, DerivedKey};
pub use password::{hash_password, verify_password, PasswordHash};

/// Length of every symmetric key, in bytes.
pub const KEY_LEN: usize = 32;

/// Separator between hex fields in every serialized form.
pub(crate) const FIELD_SEPARATOR: char = ':';
