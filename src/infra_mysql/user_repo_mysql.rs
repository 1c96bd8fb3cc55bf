use super::util::{downcast, is_dup_key};
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_user(row: MySqlRow) -> Result<User, StoreError> {
        Ok(User {
            id: row.try_get("id").map_err(StoreError::backend)?,
            username: row.try_get("username").map_err(StoreError::backend)?,
            password_hash: row.try_get("password_hash").map_err(StoreError::backend)?,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        username: &str,
        password_hash: &str,
    ) -> Result<UserInsert, StoreError> {
        let tx = downcast(tx)?;

        let res = sqlx::query(
            r#"
INSERT INTO user (username, password_hash)
VALUES (?, ?)
"#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(tx.conn())
        .await;

        match res {
            Ok(done) => Ok(UserInsert::Created(UserId(done.last_insert_id() as i64))),
            Err(e) if is_dup_key(&e) => Ok(UserInsert::Conflict),
            Err(e) => Err(StoreError::Backend(format!("insert user: {e}"))),
        }
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        let row_opt: Option<MySqlRow> =
            sqlx::query("SELECT id, username, password_hash FROM user WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(format!("query user by id: {e}")))?;

        row_opt.map(Self::row_to_user).transpose()
    }

    async fn find_by_name(&self, username: &str) -> Result<Option<User>, StoreError> {
        // `username` uses a binary collation, so this match is case-sensitive.
        let row_opt: Option<MySqlRow> =
            sqlx::query("SELECT id, username, password_hash FROM user WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(format!("query user by name: {e}")))?;

        row_opt.map(Self::row_to_user).transpose()
    }
}
