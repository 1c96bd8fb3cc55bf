use crate::domain_model::*;
use crate::domain_port::repo_tx::{StorageTx, StoreError};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostInsert {
    Created(PostId),
    /// `author_id` does not reference an existing user.
    AuthorMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostWrite {
    Applied,
    NotFound,
}

/// Post store. Reads always join the author's username.
#[async_trait::async_trait]
pub trait PostRepo: Send + Sync {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        title: &str,
        body: &str,
        author_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<PostInsert, StoreError>;

    async fn update_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        title: &str,
        body: &str,
    ) -> Result<PostWrite, StoreError>;

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
    ) -> Result<PostWrite, StoreError>;

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
    ) -> Result<Option<PostWithAuthor>, StoreError>;

    async fn get(&self, post_id: PostId) -> Result<Option<PostWithAuthor>, StoreError>;

    /// Newest first by `created_at`; ties keep store order.
    async fn list_all(&self) -> Result<Vec<PostWithAuthor>, StoreError>;
}
