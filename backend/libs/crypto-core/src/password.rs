/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password hash is not a valid PHC string: {0}")]
    InvalidHash(String),
}

/// Well-formed Argon2id hash, at the default cost, that no password matches.
///
/// Verifying against it costs the same as checking a real account, so callers
/// use it when a lookup misses to keep both paths equally slow.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$foqkB8zllb75NjeUvZxxwA$EHjbdL47FpoZ+AWwJzqhB0ErUU7oUnm30HcE75mTmkA";

/// Hash a password with Argon2id and a fresh random salt.
///
/// Returns a PHC-formatted string safe for storage. Strength rules are the
/// caller's concern.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a password against a stored hash.
///
/// `Ok(false)` on mismatch; `Err` only when the stored hash itself is unusable.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e.to_string())),
    }
}
