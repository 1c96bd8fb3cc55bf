use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::SessionRevocationStore;
use crate::logger::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String, // user id
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String, // revocation key
}

/// Stateless sessions: the signed token is the session. Ending one
/// records its `jti` until the token would have expired.
pub struct JwtSessionManager {
    cfg: SessionConfig,
    revocations: Arc<dyn SessionRevocationStore>,
}

impl JwtSessionManager {
    pub fn new(cfg: SessionConfig, revocations: Arc<dyn SessionRevocationStore>) -> Self {
        JwtSessionManager { cfg, revocations }
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        // Revocations are kept until `exp` only.
        v.leeway = 0;
        v.set_audience(&[self.cfg.audience.clone()]);
        v.set_issuer(&[self.cfg.issuer.clone()]);
        v
    }

    fn issue(&self, user_id: UserId, jti: String) -> Result<(String, DateTime<Utc>), AuthError> {
        let iat_dt = Utc::now();
        let exp_dt = iat_dt + self.cfg.ttl;
        let claims = SessionClaims {
            sub: user_id.to_string(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.cfg.signing_key),
        )
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok((token, exp_dt))
    }

    fn verify(&self, token: &SessionToken) -> Option<SessionClaims> {
        match decode::<SessionClaims>(
            token.as_str(),
            &DecodingKey::from_secret(&self.cfg.signing_key),
            &self.validation(),
        ) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("session token rejected: {}", e);
                None
            }
        }
    }

    fn ttl_secs(exp: i64) -> u64 {
        let secs = exp - Utc::now().timestamp();
        if secs <= 0 { 1 } else { secs as u64 }
    }
}

#[async_trait::async_trait]
impl SessionManager for JwtSessionManager {
    async fn begin(
        &self,
        user_id: UserId,
        replacing: Option<&SessionToken>,
    ) -> Result<Session, AuthError> {
        if let Some(old) = replacing {
            self.end(old).await?;
        }

        let (token, expires_at) = self.issue(user_id, Uuid::new_v4().to_string())?;
        Ok(Session {
            token: SessionToken(token),
            user_id,
            expires_at,
        })
    }

    async fn resolve(&self, token: &SessionToken) -> Result<Option<UserId>, AuthError> {
        let Some(claims) = self.verify(token) else {
            return Ok(None);
        };
        if self.revocations.is_revoked(&claims.jti).await? {
            return Ok(None);
        }
        Ok(claims.sub.parse::<UserId>().ok())
    }

    async fn end(&self, token: &SessionToken) -> Result<(), AuthError> {
        // Tokens that no longer verify cannot resolve, nothing to record.
        let Some(claims) = self.verify(token) else {
            return Ok(());
        };
        self.revocations
            .revoke(&claims.jti, Self::ttl_secs(claims.exp))
            .await?;
        Ok(())
    }
}
