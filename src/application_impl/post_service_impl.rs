use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use std::sync::Arc;

pub struct RealPostService {
    post_repo: Arc<dyn PostRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealPostService {
    pub fn new(post_repo: Arc<dyn PostRepo>, tx_manager: Arc<dyn TxManager>) -> Self {
        Self {
            post_repo,
            tx_manager,
        }
    }

    async fn begin(&self) -> Result<Box<dyn StorageTx>, PostError> {
        self.tx_manager
            .begin()
            .await
            .map_err(|e| PostError::Store(e.to_string()))
    }

    fn owned_by(
        post: Option<PostWithAuthor>,
        post_id: PostId,
        user: &User,
    ) -> Result<PostWithAuthor, PostError> {
        let post = post.ok_or(PostError::NotFound(post_id))?;
        if !post.is_authored_by(user.id) {
            warn!(%post_id, user_id = %user.id, "post ownership check failed");
            return Err(PostError::Forbidden(post_id));
        }
        Ok(post)
    }
}

#[async_trait::async_trait]
impl PostService for RealPostService {
    async fn create(&self, user: Option<&User>, input: PostInput) -> Result<PostId, PostError> {
        let user = require_identity(user)?;
        input.validate()?;

        let mut tx = self.begin().await?;
        match self
            .post_repo
            .insert_in_tx(tx.as_mut(), &input.title, &input.body, user.id, Utc::now())
            .await?
        {
            PostInsert::Created(post_id) => {
                tx.commit()
                    .await
                    .map_err(|e| PostError::Store(e.to_string()))?;
                info!(%post_id, author_id = %user.id, "post created");
                Ok(post_id)
            }
            // The identity vanished between resolution and insert.
            PostInsert::AuthorMissing => {
                tx.rollback()
                    .await
                    .map_err(|e| PostError::Store(e.to_string()))?;
                warn!(author_id = %user.id, "post author no longer exists");
                Err(PostError::Unauthenticated)
            }
        }
    }

    async fn read(&self, post_id: PostId) -> Result<PostWithAuthor, PostError> {
        self.post_repo
            .get(post_id)
            .await?
            .ok_or(PostError::NotFound(post_id))
    }

    async fn read_for_edit(
        &self,
        user: Option<&User>,
        post_id: PostId,
    ) -> Result<PostWithAuthor, PostError> {
        let user = require_identity(user)?;
        let post = self.post_repo.get(post_id).await?;
        Self::owned_by(post, post_id, user)
    }

    async fn update(
        &self,
        user: Option<&User>,
        post_id: PostId,
        input: PostInput,
    ) -> Result<(), PostError> {
        let user = require_identity(user)?;

        let mut tx = self.begin().await?;
        let post = self.post_repo.get_in_tx(tx.as_mut(), post_id).await?;
        Self::owned_by(post, post_id, user)?;
        input.validate()?;

        match self
            .post_repo
            .update_in_tx(tx.as_mut(), post_id, &input.title, &input.body)
            .await?
        {
            PostWrite::Applied => {
                tx.commit()
                    .await
                    .map_err(|e| PostError::Store(e.to_string()))?;
                info!(%post_id, "post updated");
                Ok(())
            }
            PostWrite::NotFound => Err(PostError::NotFound(post_id)),
        }
    }

    async fn delete(&self, user: Option<&User>, post_id: PostId) -> Result<(), PostError> {
        let user = require_identity(user)?;

        let mut tx = self.begin().await?;
        let post = self.post_repo.get_in_tx(tx.as_mut(), post_id).await?;
        Self::owned_by(post, post_id, user)?;

        match self.post_repo.delete_in_tx(tx.as_mut(), post_id).await? {
            PostWrite::Applied => {
                tx.commit()
                    .await
                    .map_err(|e| PostError::Store(e.to_string()))?;
                info!(%post_id, "post deleted");
                Ok(())
            }
            PostWrite::NotFound => Err(PostError::NotFound(post_id)),
        }
    }

    async fn list_public(&self) -> Result<Vec<PostWithAuthor>, PostError> {
        Ok(self.post_repo.list_all().await?)
    }
}
