/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Password does not match the stored hash. Expected during sign-in.
    #[error("credential mismatch")]
    Mismatch,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Build Argon2id parameters for a cost factor
///
/// The cost factor is the Argon2 time cost (number of passes). Memory cost and
/// parallelism stay at the Argon2 defaults.
///
/// ## Errors
///
/// Returns `PasswordError::Hashing` if the primitive rejects the cost
/// (e.g. zero passes).
pub fn hashing_params(cost: u32) -> Result<Params, PasswordError> {
    Params::new(
        Params::DEFAULT_M_COST,
        cost,
        Params::DEFAULT_P_COST,
        None,
    )
    .map_err(|e| PasswordError::Hashing(format!("invalid cost factor {}: {}", cost, e)))
}

/// Hash a password using Argon2id algorithm
///
/// ## Security
///
/// - Algorithm: Argon2id v0x13
/// - Salt: Random 16-byte salt generated per password
/// - Time cost: `cost`
///
/// ## Returns
///
/// PHC-formatted hash string safe for database storage
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let params = hashing_params(cost)?;
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its hash
///
/// Parameters are read from the PHC string, so hashes produced with an older
/// cost factor keep verifying after the configuration changes.
///
/// ## Errors
///
/// - `PasswordError::Mismatch` if the password is wrong
/// - `PasswordError::Hashing` if the stored hash cannot be parsed
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| PasswordError::Hashing(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(()),
        Err(argon2::password_hash::Error::Password) => Err(PasswordError::Mismatch),
        Err(e) => Err(PasswordError::Hashing(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}
