use crate::application_port::Unauthenticated;
use crate::domain_model::*;
use crate::domain_port::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("login required")]
    Unauthenticated,
    #[error("{message}")]
    Validation { message: String },
    #[error("Post id {0} doesn't exist.")]
    NotFound(PostId),
    #[error("post {0} belongs to another user")]
    Forbidden(PostId),
    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for PostError {
    fn from(error: StoreError) -> Self {
        PostError::Store(error.to_string())
    }
}

impl From<Unauthenticated> for PostError {
    fn from(_: Unauthenticated) -> Self {
        PostError::Unauthenticated
    }
}

#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub body: String,
}

impl PostInput {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        PostInput {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Title is required; an empty body is accepted.
    pub fn validate(&self) -> Result<(), PostError> {
        if self.title.is_empty() {
            return Err(PostError::Validation {
                message: "Title is required.".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
pub trait PostService: Send + Sync {
    async fn create(&self, user: Option<&User>, input: PostInput) -> Result<PostId, PostError>;

    /// Public single-post read, no ownership check.
    async fn read(&self, post_id: PostId) -> Result<PostWithAuthor, PostError>;

    async fn read_for_edit(
        &self,
        user: Option<&User>,
        post_id: PostId,
    ) -> Result<PostWithAuthor, PostError>;

    async fn update(
        &self,
        user: Option<&User>,
        post_id: PostId,
        input: PostInput,
    ) -> Result<(), PostError>;

    async fn delete(&self, user: Option<&User>, post_id: PostId) -> Result<(), PostError>;

    async fn list_public(&self) -> Result<Vec<PostWithAuthor>, PostError>;
}
