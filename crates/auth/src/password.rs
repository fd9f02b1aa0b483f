//! Password policy, hashing and verification
//!
//! Uses Argon2id for password hashing. Hashes are stored in PHC format and
//! the plaintext never leaves this module.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AuthError, Result};

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Symbols that satisfy the symbol requirement
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:,.<>?/~";

/// Check a candidate password against the account policy
///
/// At least 8 characters with one letter, one digit and one symbol from
/// [`PASSWORD_SYMBOLS`].
///
/// # Example
///
/// ```
/// use mediguard_auth::password::check_policy;
///
/// assert!(check_policy("abc!2345").is_ok());
/// assert!(check_policy("abc12345").is_err());
/// ```
pub fn check_policy(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AuthError::validation("password must contain a letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::validation("password must contain a digit"));
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(AuthError::validation(format!(
            "password must contain one of {}",
            PASSWORD_SYMBOLS
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id
///
/// Returns the hash in PHC format: `$argon2id$v=19$m=...,t=...,p=...$salt$hash`
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(format!("password hash failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash
///
/// # Example
///
/// ```
/// use mediguard_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("Secret1!").unwrap();
/// assert!(verify_password("Secret1!", &hash).unwrap());
/// assert!(!verify_password("Secret2!", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::PasswordHash(format!("invalid password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHash(format!(
            "password verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_accepts_all_classes() {
        assert!(check_policy("abc!2345").is_ok());
        assert!(check_policy("Secret1!").is_ok());
        assert!(check_policy("a-very-long-passphrase-9").is_ok());
    }

    #[test]
    fn test_policy_rejects_missing_symbol() {
        let err = check_policy("abc12345").unwrap_err();
        assert!(err.to_string().contains("one of"));
    }

    #[test]
    fn test_policy_rejects_letters_only() {
        assert!(check_policy("abcdefgh").is_err());
    }

    #[test]
    fn test_policy_rejects_missing_letter() {
        assert!(check_policy("1234!5678").is_err());
    }

    #[test]
    fn test_policy_rejects_short() {
        let err = check_policy("Ab1!").unwrap_err();
        assert!(err.to_string().contains("at least 8"));
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("Secret1!").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        // Different salt each time
        let hash2 = hash_password("Secret1!").unwrap();
        assert_ne!(hash, hash2);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("Secret1!").unwrap();
        assert!(!verify_password("secret1!", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let result = verify_password("Secret1!", "not_a_valid_hash");
        assert!(matches!(result, Err(AuthError::PasswordHash(_))));
    }
}
