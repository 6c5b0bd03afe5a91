//! One-way secret hashing for portal accounts.
//!
//! Secrets are stored as Argon2id PHC strings. Test builds use reduced parameters so the
//! suite stays fast; the PHC string records the parameters, so verification works either way.

use std::fmt;

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
#[cfg(test)]
use argon2::{Algorithm, Params, Version};

/// Argon2 PHC string for an account secret. Never holds plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretHash(String);

impl SecretHash {
    /// Wraps a PHC string loaded from storage.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHash(<redacted>)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("secret hashing failed: {0}")]
    Hashing(String),
}

#[inline]
fn argon2_instance() -> Argon2<'static> {
    #[cfg(test)]
    {
        match Params::new(1024, 1, 1, None) {
            Ok(params) => Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            Err(_) => Argon2::default(),
        }
    }

    #[cfg(not(test))]
    {
        Argon2::default()
    }
}

pub fn hash_secret(secret: &str) -> Result<SecretHash, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2_instance()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| SecretHash(hash.to_string()))
        .map_err(|err| CredentialError::Hashing(err.to_string()))
}

/// Malformed stored hashes verify as `false`.
pub fn verify_secret(hash: &SecretHash, secret: &str) -> bool {
    let parsed = match PasswordHash::new(hash.as_phc()) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    argon2_instance()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}
