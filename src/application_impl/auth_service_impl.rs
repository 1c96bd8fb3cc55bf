use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    session_manager: Arc<dyn SessionManager>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        session_manager: Arc<dyn SessionManager>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            session_manager,
            tx_manager,
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, credentials: Credentials) -> Result<UserId, AuthError> {
        credentials.validate()?;
        let Credentials { username, password } = credentials;

        if self.user_repo.find_by_name(&username).await?.is_some() {
            return Err(AuthError::UsernameTaken(username));
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        // The unique index decides races the pre-check above could not see.
        match self
            .user_repo
            .insert_in_tx(tx.as_mut(), &username, &password_hash)
            .await?
        {
            UserInsert::Created(user_id) => {
                tx.commit()
                    .await
                    .map_err(|e| AuthError::Store(e.to_string()))?;
                info!(%user_id, %username, "user registered");
                Ok(user_id)
            }
            UserInsert::Conflict => {
                tx.rollback()
                    .await
                    .map_err(|e| AuthError::Store(e.to_string()))?;
                Err(AuthError::UsernameTaken(username))
            }
        }
    }

    async fn authenticate(
        &self,
        credentials: Credentials,
        current: Option<&SessionToken>,
    ) -> Result<Session, AuthError> {
        let Credentials { username, password } = credentials;

        let user = self
            .user_repo
            .find_by_name(&username)
            .await?
            .ok_or(AuthError::InvalidUsername)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            debug!(%username, "login rejected: wrong password");
            return Err(AuthError::InvalidPassword);
        }

        let session = self.session_manager.begin(user.id, current).await?;
        info!(user_id = %user.id, %username, "user logged in");
        Ok(session)
    }

    async fn logout(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.session_manager.end(token).await?;
        debug!("session ended");
        Ok(())
    }

    async fn current_identity(
        &self,
        token: Option<&SessionToken>,
    ) -> Result<Option<User>, AuthError> {
        let Some(token) = token else {
            return Ok(None);
        };
        let Some(user_id) = self.session_manager.resolve(token).await? else {
            return Ok(None);
        };
        Ok(self.user_repo.find_by_id(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{Argon2PasswordHasher, JwtSessionManager, SessionConfig};
    use crate::infra_memory::*;
    use std::time::Duration;

    fn service() -> RealAuthService {
        let store = MemoryStore::new();
        let session_manager = JwtSessionManager::new(
            SessionConfig {
                issuer: "tinyblog.test".to_string(),
                audience: "tinyblog-web".to_string(),
                ttl: Duration::from_secs(600),
                signing_key: b"test-key".to_vec(),
            },
            Arc::new(MemorySessionRevocationStore::new()),
        );
        RealAuthService::new(
            Arc::new(MemoryUserRepo::new(store.clone())),
            Arc::new(Argon2PasswordHasher),
            Arc::new(session_manager),
            Arc::new(MemoryTxManager::new(store)),
        )
    }

    #[tokio::test]
    async fn registering_twice_is_taken() {
        let auth = service();
        auth.register(Credentials::new("a", "a")).await.unwrap();
        let err = auth.register(Credentials::new("a", "b")).await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken(ref name) if name == "a"));
        assert_eq!(err.to_string(), "User a is already registered.");
    }

    #[tokio::test]
    async fn register_validates_username_first() {
        let auth = service();
        let err = auth.register(Credentials::new("", "")).await.unwrap_err();
        assert_eq!(err.to_string(), "User name is required.");
        let err = auth.register(Credentials::new("a", "")).await.unwrap_err();
        assert_eq!(err.to_string(), "Password is required.");
    }

    #[tokio::test]
    async fn login_resolves_to_registered_user() {
        let auth = service();
        let user_id = auth.register(Credentials::new("test", "test")).await.unwrap();

        let session = auth
            .authenticate(Credentials::new("test", "test"), None)
            .await
            .unwrap();
        let me = auth.current_identity(Some(&session.token)).await.unwrap().unwrap();
        assert_eq!(me.id, user_id);
        assert_eq!(me.username, "test");
    }

    #[tokio::test]
    async fn login_distinguishes_unknown_user_and_wrong_password() {
        let auth = service();
        auth.register(Credentials::new("test", "test")).await.unwrap();

        let err = auth
            .authenticate(Credentials::new("a", "test"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidUsername));

        let err = auth
            .authenticate(Credentials::new("test", "a"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
    }

    #[tokio::test]
    async fn login_with_empty_fields_is_rejected_as_incorrect() {
        let auth = service();
        auth.register(Credentials::new("test", "test")).await.unwrap();

        let err = auth
            .authenticate(Credentials::new("", "x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidUsername));

        let err = auth
            .authenticate(Credentials::new("test", ""), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
    }

    #[tokio::test]
    async fn logout_clears_identity() {
        let auth = service();
        auth.register(Credentials::new("test", "test")).await.unwrap();
        let session = auth
            .authenticate(Credentials::new("test", "test"), None)
            .await
            .unwrap();

        auth.logout(&session.token).await.unwrap();
        auth.logout(&session.token).await.unwrap();
        assert!(auth.current_identity(Some(&session.token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn relogin_replaces_session() {
        let auth = service();
        auth.register(Credentials::new("a", "a")).await.unwrap();
        let b_id = auth.register(Credentials::new("b", "b")).await.unwrap();

        let first = auth.authenticate(Credentials::new("a", "a"), None).await.unwrap();
        let second = auth
            .authenticate(Credentials::new("b", "b"), Some(&first.token))
            .await
            .unwrap();

        assert!(auth.current_identity(Some(&first.token)).await.unwrap().is_none());
        let me = auth.current_identity(Some(&second.token)).await.unwrap().unwrap();
        assert_eq!(me.id, b_id);
    }

    #[tokio::test]
    async fn anonymous_without_token() {
        let auth = service();
        assert!(auth.current_identity(None).await.unwrap().is_none());
    }
}
