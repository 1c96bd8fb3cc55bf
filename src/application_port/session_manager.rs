use crate::application_port::AuthError;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait SessionManager: Send + Sync {
    /// Issue a token for `user_id`, ending `replacing` first when given.
    async fn begin(
        &self,
        user_id: UserId,
        replacing: Option<&SessionToken>,
    ) -> Result<Session, AuthError>;

    /// Tampered, expired and ended tokens yield `None`, not an error.
    async fn resolve(&self, token: &SessionToken) -> Result<Option<UserId>, AuthError>;

    /// Idempotent.
    async fn end(&self, token: &SessionToken) -> Result<(), AuthError>;
}
