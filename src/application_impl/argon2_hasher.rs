use crate::application_port::*;
use crate::logger::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as PhcError, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Argon2id with a fresh random salt per hash, stored as a PHC string.
#[derive(Debug, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    fn engine() -> Argon2<'static> {
        Argon2::default()
    }
}

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Self::engine()
            .hash_password(password.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| {
                error!("password hashing failed: {}", e);
                AuthError::InternalError(e.to_string())
            })
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        // A stored value that is not PHC means the user row is corrupt.
        let stored = PasswordHash::new(password_hash).map_err(|e| {
            warn!("stored password hash is not a PHC string: {}", e);
            AuthError::InternalError(format!("invalid PHC hash: {e}"))
        })?;

        match Self::engine().verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => {
                debug!(algorithm = %stored.algorithm, "password mismatch");
                Ok(false)
            }
            Err(e) => {
                warn!(algorithm = %stored.algorithm, "password verification failed: {}", e);
                Err(AuthError::InternalError(format!("verify error: {e}")))
            }
        }
    }
}
