use std::any::Any;

#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>>;
}

/// One all-or-nothing unit of work. Dropping without `commit` rolls back.
#[async_trait::async_trait]
pub trait StorageTx: Send {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;

    /// Lets an adapter recover its concrete transaction type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transaction belongs to another backend")]
    ForeignTx,
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(error: E) -> Self {
        StoreError::Backend(error.to_string())
    }
}
