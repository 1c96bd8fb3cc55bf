use crate::application_port::Session;
use crate::domain_model::*;
use crate::domain_port::StoreError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Username,
    Password,
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialField::Username => f.write_str("User name"),
            CredentialField::Password => f.write_str("Password"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{field} is required.")]
    Validation { field: CredentialField },
    #[error("User {0} is already registered.")]
    UsernameTaken(String),
    #[error("Incorrect user name.")]
    InvalidUsername,
    #[error("Incorrect password.")]
    InvalidPassword,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        AuthError::Store(error.to_string())
    }
}

/// Username and plaintext password as submitted by the client.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reports the first missing field only.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.is_empty() {
            return Err(AuthError::Validation {
                field: CredentialField::Username,
            });
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation {
                field: CredentialField::Password,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Returned by the authorization gate when no user is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("login required")]
pub struct Unauthenticated;

/// The gate every protected operation calls before touching state.
pub fn require_identity(user: Option<&User>) -> Result<&User, Unauthenticated> {
    user.ok_or(Unauthenticated)
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, credentials: Credentials) -> Result<UserId, AuthError>;

    /// Signs the user in. A token the client already holds is ended first.
    async fn authenticate(
        &self,
        credentials: Credentials,
        current: Option<&SessionToken>,
    ) -> Result<Session, AuthError>;

    async fn logout(&self, token: &SessionToken) -> Result<(), AuthError>;

    /// Missing, invalid or ended tokens resolve to `None`.
    async fn current_identity(&self, token: Option<&SessionToken>)
    -> Result<Option<User>, AuthError>;
}
