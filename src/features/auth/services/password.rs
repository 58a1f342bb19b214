//! bcrypt hashing, run on the blocking pool so request workers are not stalled.

use lazy_static::lazy_static;

use crate::core::error::{AppError, Result};

lazy_static! {
    /// Stand-in hash checked when no account matches, so both login failures cost one bcrypt verify
    static ref UNKNOWN_ACCOUNT_HASH: String =
        bcrypt::hash("medreport-unknown-account", bcrypt::DEFAULT_COST).unwrap_or_default();
}

pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Returns `false` for a mismatch; a malformed stored hash is an internal error.
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Run a verification that always fails, for logins without a matching account
pub async fn verify_unknown_account(password: String) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let _ = bcrypt::verify(password, UNKNOWN_ACCOUNT_HASH.as_str());
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
}
