use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tb_core::error::Result;
use tb_core::forms::{ensure_valid, NewUser};
use tb_core::models::{DbId, User};
use tb_core::traits::UserRepo;

use crate::{db_err, SqliteStore};

fn user_from_row(row: &SqliteRow) -> sqlx::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepo for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        ensure_valid(&user)?;
        let now = Utc::now();

        let id = sqlx::query("INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)")
            .bind(user.username.as_str())
            .bind(user.password_hash.as_str())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .last_insert_rowid();

        tracing::info!(user_id = id, username = %user.username, "user created");
        Ok(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            created_at: now,
        })
    }

    async fn get_user(&self, id: DbId) -> Result<Option<User>> {
        sqlx::query("SELECT id, username, password_hash, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| user_from_row(&row))
            .transpose()
            .map_err(db_err)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query("SELECT id, username, password_hash, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| user_from_row(&row))
            .transpose()
            .map_err(db_err)
    }

    async fn delete_user(&self, id: DbId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();

        tracing::info!(user_id = id, deleted, "user delete");
        Ok(deleted > 0)
    }
}
