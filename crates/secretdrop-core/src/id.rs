//! ID generation utilities.

use uuid::Uuid;

/// Number of random bytes behind a retrieval token.
const TOKEN_BYTES: usize = 32;

/// Generate a new UUID v4.
pub fn uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Generate an unguessable, URL-safe token.
///
/// Retrieval record ids end up in links handed to the requestor, so they
/// carry 256 bits of randomness instead of a UUID's 122.
pub fn token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Check whether a string could be an id produced by this module.
///
/// Used to reject obviously bogus ids before they reach the store.
pub fn is_well_formed(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
