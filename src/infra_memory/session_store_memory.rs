use crate::domain_port::*;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Revocation list kept in process memory. Entries drop out once their
/// token could no longer verify.
#[derive(Default)]
pub struct MemorySessionRevocationStore {
    revoked: DashMap<String, Instant>,
}

impl MemorySessionRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionRevocationStore for MemorySessionRevocationStore {
    async fn revoke(&self, jti: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let until = Instant::now() + Duration::from_secs(ttl_secs);
        self.revoked.insert(jti.to_string(), until);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        self.revoked.remove_if(jti, |_, until| *until <= now);
        Ok(self.revoked.contains_key(jti))
    }
}
