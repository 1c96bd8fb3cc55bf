use super::repo_tx_memory::{MemoryStore, downcast};
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryUserRepo {
    store: MemoryStore,
}

impl MemoryUserRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryUserRepo { store }
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        username: &str,
        password_hash: &str,
    ) -> Result<UserInsert, StoreError> {
        let tables = downcast(tx)?.tables();
        if tables.users.iter().any(|u| u.username == username) {
            return Ok(UserInsert::Conflict);
        }

        let id = tables.next_user_id();
        tables.users.push(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        });
        Ok(UserInsert::Created(id))
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self
            .store
            .read(|t| t.users.iter().find(|u| u.id == user_id).cloned())
            .await)
    }

    async fn find_by_name(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .store
            .read(|t| t.users.iter().find(|u| u.username == username).cloned())
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryTxManager;

    #[tokio::test]
    async fn duplicate_username_conflicts_without_writing() {
        let store = MemoryStore::new();
        let txm = MemoryTxManager::new(store.clone());
        let repo = MemoryUserRepo::new(store);

        let mut tx = txm.begin().await.unwrap();
        let first = repo.insert_in_tx(tx.as_mut(), "alice", "h1").await.unwrap();
        let second = repo.insert_in_tx(tx.as_mut(), "alice", "h2").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first, UserInsert::Created(UserId(1)));
        assert_eq!(second, UserInsert::Conflict);
        let alice = repo.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(alice.password_hash, "h1");
    }

    #[tokio::test]
    async fn lookups_are_exact_and_absence_is_none() {
        let store = MemoryStore::new();
        let txm = MemoryTxManager::new(store.clone());
        let repo = MemoryUserRepo::new(store);

        let mut tx = txm.begin().await.unwrap();
        repo.insert_in_tx(tx.as_mut(), "Alice", "h").await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.find_by_name("alice").await.unwrap().is_none());
        assert!(repo.find_by_name("Alice").await.unwrap().is_some());
        assert!(repo.find_by_id(UserId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rollback_discards_insert() {
        let store = MemoryStore::new();
        let txm = MemoryTxManager::new(store.clone());
        let repo = MemoryUserRepo::new(store);

        let mut tx = txm.begin().await.unwrap();
        repo.insert_in_tx(tx.as_mut(), "ghost", "h").await.unwrap();
        tx.rollback().await.unwrap();

        assert!(repo.find_by_name("ghost").await.unwrap().is_none());
    }
}
