//! Password hashing for signup/login (bcrypt, as the user store expects).

use bcrypt::{DEFAULT_COST, hash, verify};
use tracing::error;

use crate::error::AppError;

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    hash(plain, DEFAULT_COST).map_err(|e| {
        error!(error = %e, "failed to hash password");
        AppError::Internal
    })
}

/// Constant-time verification against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch rather than an error; login
/// must not leak whether a row exists or is corrupt.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    verify(plain, stored_hash).unwrap_or(false)
}
