use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

pub struct RedisSessionRevocationStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionRevocationStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionRevocationStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, jti: &str) -> String {
        format!("{}:{}", self.prefix, jti)
    }
}

#[async_trait::async_trait]
impl SessionRevocationStore for RedisSessionRevocationStore {
    async fn revoke(&self, jti: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let key = self.key(jti);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, 1u8, ttl_secs.max(1))
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, StoreError> {
        let key = self.key(jti);
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(&key).await.map_err(StoreError::backend)?;
        Ok(found)
    }
}
