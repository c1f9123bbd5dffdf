/*
 * Responsibility
 * - パスワードの hash / verify (Argon2id, PHC 文字列)
 * - salt は getrandom で 16 bytes 生成
 */
use std::sync::OnceLock;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use tracing::error;

use crate::error::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::fill(&mut salt_bytes).map_err(|e| {
        error!(error = %e, "failed to generate password salt");
        AppError::Internal
    })?;

    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
        error!(error = %e, "failed to encode password salt");
        AppError::Internal
    })?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "failed to hash password");
            AppError::Internal
        })?
        .to_string();

    Ok(phc)
}

/// Unparsable hashes never verify.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Same Argon2 cost as `verify_password`, against a hash no account owns.
pub fn verify_dummy(password: &str) {
    let hash = DUMMY_HASH.get_or_init(|| hash_password("no-such-account").ok());
    if let Some(hash) = hash {
        let _ = verify_password(hash, password);
    }
}
