use std::sync::LazyLock;

use zeroize::{Zeroize, Zeroizing};

use crate::error::Result;

/// The bcrypt work factor.
pub const BCRYPT_COST: u32 = 10;

/// A throwaway hash verified against when the account does not exist, so an
/// unknown email costs the same time as a wrong password.
static TIMING_DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("etlog-timing-equalizer", BCRYPT_COST).ok());

/// Hashes a password using bcrypt.
///
/// Length rules are enforced by request validation before this is called.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the hashed password.
pub fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();
    let hashed = bcrypt::hash(&password_bytes, BCRYPT_COST);
    password_bytes.zeroize();

    let hashed = hashed?;
    tracing::debug!("Password hashed successfully with bcrypt");
    Ok(hashed)
}

/// Verifies a password against a hash.
///
/// # Arguments
///
/// * `password` - The password to verify.
/// * `hash` - The hash to verify against.
///
/// # Returns
///
/// A `Result` containing `true` if the password is valid, `false` otherwise.
/// A stored hash that cannot be parsed is an error, never a match.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let result = bcrypt::verify(&password_bytes, hash);
    password_bytes.zeroize();

    let matched = result?;
    tracing::debug!("Password verification completed");
    Ok(matched)
}

/// Spends one verification's worth of work without comparing anything real.
pub fn equalize_timing(password: &str) {
    if let Some(dummy) = TIMING_DUMMY_HASH.as_deref() {
        let _ = bcrypt::verify(password, dummy);
    }
}

/// Hashes on the blocking pool so the runtime keeps serving other requests.
pub async fn hash_in_background(password: Zeroizing<String>) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// Verifies on the blocking pool. `None` for the hash runs the timing
/// equalizer and reports no match.
pub async fn verify_in_background(
    password: Zeroizing<String>,
    hash: Option<String>,
) -> Result<bool> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            equalize_timing(&password);
            Ok(false)
        }
    })
    .await?
}
