use super::util::{downcast, is_missing_parent};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

const SELECT_POST: &str = r#"
SELECT p.id, p.title, p.body, p.author_id, u.username, p.created_at
FROM post p
JOIN user u ON u.id = p.author_id
"#;

pub struct MySqlPostRepo {
    pool: MySqlPool,
}

impl MySqlPostRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPostRepo { pool }
    }

    fn row_to_post(row: MySqlRow) -> Result<PostWithAuthor, StoreError> {
        Ok(PostWithAuthor {
            id: row.try_get("id").map_err(StoreError::backend)?,
            title: row.try_get("title").map_err(StoreError::backend)?,
            body: row.try_get("body").map_err(StoreError::backend)?,
            author_id: row.try_get("author_id").map_err(StoreError::backend)?,
            author_username: row.try_get("username").map_err(StoreError::backend)?,
            created_at: row.try_get("created_at").map_err(StoreError::backend)?,
        })
    }

    fn written(rows_affected: u64) -> PostWrite {
        if rows_affected == 0 {
            PostWrite::NotFound
        } else {
            PostWrite::Applied
        }
    }
}

#[async_trait::async_trait]
impl PostRepo for MySqlPostRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        title: &str,
        body: &str,
        author_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<PostInsert, StoreError> {
        let tx = downcast(tx)?;

        let res = sqlx::query(
            r#"
INSERT INTO post (title, body, author_id, created_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(title)
        .bind(body)
        .bind(author_id)
        .bind(created_at)
        .execute(tx.conn())
        .await;

        match res {
            Ok(done) => Ok(PostInsert::Created(PostId(done.last_insert_id() as i64))),
            Err(e) if is_missing_parent(&e) => Ok(PostInsert::AuthorMissing),
            Err(e) => Err(StoreError::Backend(format!("insert post: {e}"))),
        }
    }

    async fn update_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        title: &str,
        body: &str,
    ) -> Result<PostWrite, StoreError> {
        let tx = downcast(tx)?;

        // An update that changes nothing may report zero affected rows.
        let done = sqlx::query("UPDATE post SET title = ?, body = ? WHERE id = ?")
            .bind(title)
            .bind(body)
            .bind(post_id)
            .execute(tx.conn())
            .await
            .map_err(|e| StoreError::Backend(format!("update post: {e}")))?;

        if done.rows_affected() > 0 {
            return Ok(PostWrite::Applied);
        }
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM post WHERE id = ?")
            .bind(post_id)
            .fetch_one(tx.conn())
            .await
            .map_err(|e| StoreError::Backend(format!("count post: {e}")))?;
        Ok(Self::written(exists as u64))
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
    ) -> Result<PostWrite, StoreError> {
        let tx = downcast(tx)?;

        let done = sqlx::query("DELETE FROM post WHERE id = ?")
            .bind(post_id)
            .execute(tx.conn())
            .await
            .map_err(|e| StoreError::Backend(format!("delete post: {e}")))?;

        Ok(Self::written(done.rows_affected()))
    }

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
    ) -> Result<Option<PostWithAuthor>, StoreError> {
        let tx = downcast(tx)?;

        let sql = format!("{SELECT_POST} WHERE p.id = ? FOR UPDATE");
        let row_opt: Option<MySqlRow> = sqlx::query(&sql)
            .bind(post_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| StoreError::Backend(format!("query post: {e}")))?;

        row_opt.map(Self::row_to_post).transpose()
    }

    async fn get(&self, post_id: PostId) -> Result<Option<PostWithAuthor>, StoreError> {
        let sql = format!("{SELECT_POST} WHERE p.id = ?");
        let row_opt: Option<MySqlRow> = sqlx::query(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("query post: {e}")))?;

        row_opt.map(Self::row_to_post).transpose()
    }

    async fn list_all(&self) -> Result<Vec<PostWithAuthor>, StoreError> {
        let sql = format!("{SELECT_POST} ORDER BY p.created_at DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("list posts: {e}")))?;

        rows.into_iter().map(Self::row_to_post).collect()
    }
}
