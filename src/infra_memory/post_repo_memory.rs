use super::repo_tx_memory::{MemoryStore, PostRow, downcast};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};

pub struct MemoryPostRepo {
    store: MemoryStore,
}

impl MemoryPostRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryPostRepo { store }
    }
}

#[async_trait::async_trait]
impl PostRepo for MemoryPostRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        title: &str,
        body: &str,
        author_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<PostInsert, StoreError> {
        let tables = downcast(tx)?.tables();
        if !tables.users.iter().any(|u| u.id == author_id) {
            return Ok(PostInsert::AuthorMissing);
        }

        let id = tables.next_post_id();
        tables.posts.push(PostRow {
            id,
            title: title.to_string(),
            body: body.to_string(),
            author_id,
            created_at,
        });
        Ok(PostInsert::Created(id))
    }

    async fn update_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        title: &str,
        body: &str,
    ) -> Result<PostWrite, StoreError> {
        let tables = downcast(tx)?.tables();
        match tables.posts.iter_mut().find(|p| p.id == post_id) {
            Some(row) => {
                row.title = title.to_string();
                row.body = body.to_string();
                Ok(PostWrite::Applied)
            }
            None => Ok(PostWrite::NotFound),
        }
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
    ) -> Result<PostWrite, StoreError> {
        let tables = downcast(tx)?.tables();
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != post_id);
        if tables.posts.len() < before {
            Ok(PostWrite::Applied)
        } else {
            Ok(PostWrite::NotFound)
        }
    }

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
    ) -> Result<Option<PostWithAuthor>, StoreError> {
        let tables = downcast(tx)?.tables();
        Ok(tables.post(post_id))
    }

    async fn get(&self, post_id: PostId) -> Result<Option<PostWithAuthor>, StoreError> {
        Ok(self.store.read(|t| t.post(post_id)).await)
    }

    async fn list_all(&self) -> Result<Vec<PostWithAuthor>, StoreError> {
        let mut posts: Vec<PostWithAuthor> = self
            .store
            .read(|t| t.posts.iter().filter_map(|p| t.joined(p)).collect())
            .await;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::{MemoryTxManager, MemoryUserRepo};
    use chrono::TimeZone;

    struct Fixture {
        txm: MemoryTxManager,
        users: MemoryUserRepo,
        posts: MemoryPostRepo,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        Fixture {
            txm: MemoryTxManager::new(store.clone()),
            users: MemoryUserRepo::new(store.clone()),
            posts: MemoryPostRepo::new(store),
        }
    }

    async fn seed_user(f: &Fixture, name: &str) -> UserId {
        let mut tx = f.txm.begin().await.unwrap();
        let UserInsert::Created(id) = f.users.insert_in_tx(tx.as_mut(), name, "h").await.unwrap()
        else {
            panic!("seed user {name} conflicted");
        };
        tx.commit().await.unwrap();
        id
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn insert_requires_existing_author() {
        let f = fixture();
        let mut tx = f.txm.begin().await.unwrap();
        let res = f
            .posts
            .insert_in_tx(tx.as_mut(), "t", "b", UserId(404), at(0))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(res, PostInsert::AuthorMissing);
        assert!(f.posts.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first_regardless_of_insert_order() {
        let f = fixture();
        let author = seed_user(&f, "test").await;

        let mut tx = f.txm.begin().await.unwrap();
        for (title, secs) in [("middle", 10), ("oldest", 0), ("newest", 20)] {
            f.posts
                .insert_in_tx(tx.as_mut(), title, "", author, at(secs))
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();

        let titles: Vec<String> = f
            .posts
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn reads_join_author_name() {
        let f = fixture();
        let author = seed_user(&f, "test").await;

        let mut tx = f.txm.begin().await.unwrap();
        let PostInsert::Created(id) = f
            .posts
            .insert_in_tx(tx.as_mut(), "test title", "test\nbody", author, at(0))
            .await
            .unwrap()
        else {
            panic!("insert failed");
        };
        tx.commit().await.unwrap();

        let post = f.posts.get(id).await.unwrap().unwrap();
        assert_eq!(post.author_username, "test");
        assert_eq!(post.body, "test\nbody");
        assert!(post.is_authored_by(author));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let f = fixture();
        let author = seed_user(&f, "test").await;

        let mut tx = f.txm.begin().await.unwrap();
        let PostInsert::Created(id) = f
            .posts
            .insert_in_tx(tx.as_mut(), "t", "b", author, at(0))
            .await
            .unwrap()
        else {
            panic!("insert failed");
        };
        assert_eq!(
            f.posts.update_in_tx(tx.as_mut(), id, "t2", "").await.unwrap(),
            PostWrite::Applied
        );
        assert_eq!(
            f.posts
                .update_in_tx(tx.as_mut(), PostId(9999), "x", "")
                .await
                .unwrap(),
            PostWrite::NotFound
        );
        assert_eq!(
            f.posts.delete_in_tx(tx.as_mut(), id).await.unwrap(),
            PostWrite::Applied
        );
        assert_eq!(
            f.posts.delete_in_tx(tx.as_mut(), id).await.unwrap(),
            PostWrite::NotFound
        );
        tx.commit().await.unwrap();

        assert!(f.posts.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible() {
        let f = fixture();
        let author = seed_user(&f, "test").await;

        let mut tx = f.txm.begin().await.unwrap();
        f.posts
            .insert_in_tx(tx.as_mut(), "draft", "", author, at(0))
            .await
            .unwrap();
        drop(tx);

        assert!(f.posts.list_all().await.unwrap().is_empty());
    }
}
