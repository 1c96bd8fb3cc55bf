use crate::domain_model::*;
use crate::domain_port::{StorageTx, StoreError, TxManager};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone)]
pub(crate) struct PostRow {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub users: Vec<User>,
    pub posts: Vec<PostRow>,
    last_user_id: i64,
    last_post_id: i64,
}

impl Tables {
    pub fn next_user_id(&mut self) -> UserId {
        self.last_user_id += 1;
        UserId(self.last_user_id)
    }

    pub fn next_post_id(&mut self) -> PostId {
        self.last_post_id += 1;
        PostId(self.last_post_id)
    }

    pub fn joined(&self, row: &PostRow) -> Option<PostWithAuthor> {
        let author = self.users.iter().find(|u| u.id == row.author_id)?;
        Some(PostWithAuthor {
            id: row.id,
            title: row.title.clone(),
            body: row.body.clone(),
            author_id: row.author_id,
            author_username: author.username.clone(),
            created_at: row.created_at,
        })
    }

    pub fn post(&self, post_id: PostId) -> Option<PostWithAuthor> {
        self.posts
            .iter()
            .find(|p| p.id == post_id)
            .and_then(|p| self.joined(p))
    }
}

/// Process-local relational store. Transactions are serialized: a
/// transaction holds the table lock and works on a private copy that
/// replaces the tables on commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.tables.lock().await;
        f(&tables)
    }
}

pub struct MemoryTxManager {
    store: MemoryStore,
}

impl MemoryTxManager {
    pub fn new(store: MemoryStore) -> Self {
        MemoryTxManager { store }
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>> {
        let guard = self.store.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

impl MemoryTx {
    pub(crate) fn tables(&mut self) -> &mut Tables {
        &mut self.staged
    }
}

#[async_trait::async_trait]
impl StorageTx for MemoryTx {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) fn downcast(tx: &mut dyn StorageTx) -> Result<&mut MemoryTx, StoreError> {
    tx.as_any_mut()
        .downcast_mut::<MemoryTx>()
        .ok_or(StoreError::ForeignTx)
}
