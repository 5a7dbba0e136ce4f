use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

/// The size of the CSRF token in bytes.
const CSRF_TOKEN_SIZE: usize = 32;
/// The size of a session id in bytes.
const SESSION_ID_SIZE: usize = 32;

/// Generates `len` random bytes from the OS and encodes them URL-safe.
fn random_url_safe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates a new random CSRF token.
///
/// # Returns
///
/// A URL-safe base64-encoded CSRF token.
pub fn generate_csrf_token() -> String {
    random_url_safe(CSRF_TOKEN_SIZE)
}

/// Generates a new opaque session id.
pub fn generate_session_id() -> String {
    random_url_safe(SESSION_ID_SIZE)
}

/// Compares two tokens without leaking where they differ.
pub fn tokens_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}
