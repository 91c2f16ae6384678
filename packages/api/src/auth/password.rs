//! Stored sign-in secrets for [`MemoryIdentity`](super::MemoryIdentity).
//!
//! A [`Credential`] is the Argon2id PHC string of an account's password. The
//! plaintext is checked against the identity service's own rules before it is
//! hashed and never kept.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{Error, Result};

/// Shortest password the identity service accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

const WRONG_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Hash a new account password with a fresh salt.
    pub fn create(password: &str) -> Result<Self> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Authentication(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Identity(format!("could not store password: {}", e)))?;
        Ok(Self(phc.to_string()))
    }

    /// Accept `password` or fail with the sign-in error shown to the user.
    /// A stored value that is not a PHC string is an identity service fault.
    pub fn check(&self, password: &str) -> Result<()> {
        let parsed = PasswordHash::new(&self.0)
            .map_err(|e| Error::Identity(format!("corrupt stored password: {}", e)))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| Error::Authentication(WRONG_CREDENTIALS.to_string()))
    }

    /// Rejection for an email with no account; same text as a wrong password.
    pub fn unknown_account() -> Error {
        Error::Authentication(WRONG_CREDENTIALS.to_string())
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }
}
