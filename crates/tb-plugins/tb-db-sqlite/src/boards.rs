use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tb_core::error::{AppError, Result};
use tb_core::forms::{ensure_valid, NewBoard, NewTopic};
use tb_core::models::{Board, DbId, Post, Topic, TopicSummary};
use tb_core::traits::BoardRepo;

use crate::{db_err, SqliteStore};

fn board_from_row(row: &SqliteRow) -> sqlx::Result<Board> {
    Ok(Board {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

fn topic_from_row(row: &SqliteRow) -> sqlx::Result<Topic> {
    Ok(Topic {
        id: row.try_get("id")?,
        subject: row.try_get("subject")?,
        board_id: row.try_get("board_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn post_from_row(row: &SqliteRow) -> sqlx::Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        message: row.try_get("message")?,
        topic_id: row.try_get("topic_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl BoardRepo for SqliteStore {
    async fn create_board(&self, board: NewBoard) -> Result<Board> {
        ensure_valid(&board)?;

        let id = sqlx::query("INSERT INTO boards (name, description) VALUES (?, ?)")
            .bind(board.name.as_str())
            .bind(board.description.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .last_insert_rowid();

        tracing::info!(board_id = id, name = %board.name, "board created");
        Ok(Board {
            id,
            name: board.name,
            description: board.description,
        })
    }

    async fn get_board(&self, id: DbId) -> Result<Option<Board>> {
        sqlx::query("SELECT id, name, description FROM boards WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| board_from_row(&row))
            .transpose()
            .map_err(db_err)
    }

    async fn list_boards(&self) -> Result<Vec<Board>> {
        let rows = sqlx::query("SELECT id, name, description FROM boards ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(board_from_row)
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }

    async fn delete_board(&self, id: DbId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM boards WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();

        tracing::info!(board_id = id, deleted, "board delete");
        Ok(deleted > 0)
    }

    /// Topic and opening post share one transaction so a failure between the
    /// two inserts never leaves a topic without posts.
    async fn create_topic_with_post(
        &self,
        board_id: DbId,
        author: DbId,
        topic: NewTopic,
    ) -> Result<(Topic, Post)> {
        ensure_valid(&topic)?;
        let now = Utc::now();

        // Checked outside the transaction: a deferred transaction that reads
        // first cannot take the write lock while another writer holds it. A
        // board deleted in between still fails the topic's foreign key.
        let board = sqlx::query("SELECT 1 FROM boards WHERE id = ?")
            .bind(board_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        if board.is_none() {
            return Err(AppError::not_found("Board", board_id));
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let topic_id = sqlx::query(
            "INSERT INTO topics (subject, board_id, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(topic.subject.as_str())
        .bind(board_id)
        .bind(author)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        let post_id = sqlx::query(
            "INSERT INTO posts (message, topic_id, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(topic.message.as_str())
        .bind(topic_id)
        .bind(author)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        tx.commit().await.map_err(db_err)?;
        tracing::info!(board_id, topic_id, post_id, author, "topic created");

        Ok((
            Topic {
                id: topic_id,
                subject: topic.subject,
                board_id,
                created_by: author,
                created_at: now,
                updated_at: now,
            },
            Post {
                id: post_id,
                message: topic.message,
                topic_id,
                created_by: author,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn get_topic(&self, id: DbId) -> Result<Option<Topic>> {
        sqlx::query(
            "SELECT id, subject, board_id, created_by, created_at, updated_at FROM topics WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(|row| topic_from_row(&row))
        .transpose()
        .map_err(db_err)
    }

    async fn list_topics(&self, board_id: DbId) -> Result<Vec<TopicSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.subject, t.board_id, t.created_by, t.created_at, t.updated_at,
                   u.username AS author,
                   (SELECT COUNT(*) FROM posts p WHERE p.topic_id = t.id) AS post_count
            FROM topics t
            JOIN users u ON u.id = t.created_by
            WHERE t.board_id = ?
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(TopicSummary {
                    topic: topic_from_row(row)?,
                    author: row.try_get("author")?,
                    post_count: row.try_get("post_count")?,
                })
            })
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }

    async fn delete_topic(&self, id: DbId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM topics WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();

        tracing::info!(topic_id = id, deleted, "topic delete");
        Ok(deleted > 0)
    }

    async fn list_posts(&self, topic_id: DbId) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, message, topic_id, created_by, created_at, updated_at FROM posts WHERE topic_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(post_from_row)
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
