use crate::domain_port::repo_tx::StoreError;

/// Remembers ended sessions until their tokens would have expired anyway.
#[async_trait::async_trait]
pub trait SessionRevocationStore: Send + Sync {
    /// Mark `jti` as ended for `ttl_secs`. Revoking twice is harmless.
    async fn revoke(&self, jti: &str, ttl_secs: u64) -> Result<(), StoreError>;

    async fn is_revoked(&self, jti: &str) -> Result<bool, StoreError>;
}
