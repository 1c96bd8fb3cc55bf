use crate::domain_model::*;
use crate::domain_port::repo_tx::{StorageTx, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInsert {
    Created(UserId),
    /// The username is already taken; nothing was written.
    Conflict,
}

/// Credential store. Usernames are unique and matched exactly.
#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        username: &str,
        password_hash: &str,
    ) -> Result<UserInsert, StoreError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_name(&self, username: &str) -> Result<Option<User>, StoreError>;
}
