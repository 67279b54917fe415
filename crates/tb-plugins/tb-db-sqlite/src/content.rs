//! Documents, proteins, comments and notifications.
//!
//! Attachment targets are stored as mutually exclusive nullable foreign keys
//! (`document_id`, `protein_id`, `comment_id`) guarded by a CHECK, so the
//! store rejects dangling or ambiguous references on its own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};
use tb_core::error::{AppError, Result};
use tb_core::forms::{ensure_valid, NewComment, NewDocument, NewNotification, NewProtein};
use tb_core::models::{
    Comment, ContentObject, ContentRef, DbId, Document, Notification, NotificationTarget, Protein,
};
use tb_core::traits::ContentRepo;

use crate::{db_err, SqliteStore};

const COMMENT_COLUMNS: &str =
    "id, comm, document_id, protein_id, created_by, created_at, updated_at";
const NOTIFICATION_COLUMNS: &str =
    "id, message, kind, icon, document_id, protein_id, comment_id, created_at";

fn entity_name(target: NotificationTarget) -> &'static str {
    match target {
        NotificationTarget::Document(_) => "Document",
        NotificationTarget::Protein(_) => "Protein",
        NotificationTarget::Comment(_) => "Comment",
    }
}

fn table_name(target: NotificationTarget) -> &'static str {
    match target {
        NotificationTarget::Document(_) => "documents",
        NotificationTarget::Protein(_) => "proteins",
        NotificationTarget::Comment(_) => "comments",
    }
}

/// `(document_id, protein_id)`
fn content_columns(target: ContentRef) -> (Option<DbId>, Option<DbId>) {
    match target {
        ContentRef::Document(id) => (Some(id), None),
        ContentRef::Protein(id) => (None, Some(id)),
    }
}

/// `(document_id, protein_id, comment_id)`
fn notification_columns(target: NotificationTarget) -> (Option<DbId>, Option<DbId>, Option<DbId>) {
    match target {
        NotificationTarget::Document(id) => (Some(id), None, None),
        NotificationTarget::Protein(id) => (None, Some(id), None),
        NotificationTarget::Comment(id) => (None, None, Some(id)),
    }
}

fn content_ref_from_row(row: &SqliteRow) -> sqlx::Result<ContentRef> {
    let document: Option<DbId> = row.try_get("document_id")?;
    let protein: Option<DbId> = row.try_get("protein_id")?;
    match (document, protein) {
        (Some(id), None) => Ok(ContentRef::Document(id)),
        (None, Some(id)) => Ok(ContentRef::Protein(id)),
        _ => Err(sqlx::Error::ColumnDecode {
            index: "document_id".into(),
            source: "comment must target exactly one entity".into(),
        }),
    }
}

fn notification_target_from_row(row: &SqliteRow) -> sqlx::Result<NotificationTarget> {
    let document: Option<DbId> = row.try_get("document_id")?;
    let protein: Option<DbId> = row.try_get("protein_id")?;
    let comment: Option<DbId> = row.try_get("comment_id")?;
    match (document, protein, comment) {
        (Some(id), None, None) => Ok(NotificationTarget::Document(id)),
        (None, Some(id), None) => Ok(NotificationTarget::Protein(id)),
        (None, None, Some(id)) => Ok(NotificationTarget::Comment(id)),
        _ => Err(sqlx::Error::ColumnDecode {
            index: "document_id".into(),
            source: "notification must target exactly one entity".into(),
        }),
    }
}

fn document_from_row(row: &SqliteRow) -> sqlx::Result<Document> {
    Ok(Document {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn protein_from_row(row: &SqliteRow) -> sqlx::Result<Protein> {
    Ok(Protein {
        id: row.try_get("id")?,
        aa_seq: row.try_get("aa_seq")?,
        dna_seq: row.try_get("dna_seq")?,
        content: row.try_get("content")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> sqlx::Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        comm: row.try_get("comm")?,
        target: content_ref_from_row(row)?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn notification_from_row(row: &SqliteRow) -> sqlx::Result<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        message: row.try_get("message")?,
        kind: row.try_get("kind")?,
        target: notification_target_from_row(row)?,
        icon: row.try_get("icon")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Explicit lookup of a target; run inside the writing transaction.
async fn target_exists<'e, E>(executor: E, target: NotificationTarget) -> sqlx::Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT 1 FROM {} WHERE id = ?", table_name(target));
    let row = sqlx::query(&sql)
        .bind(target.id())
        .fetch_optional(executor)
        .await?;
    Ok(row.is_some())
}

async fn insert_notification<'e, E>(
    executor: E,
    notification: NewNotification,
    now: DateTime<Utc>,
) -> Result<Notification>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    ensure_valid(&notification)?;
    let (document_id, protein_id, comment_id) = notification_columns(notification.target);

    let id = sqlx::query(
        "INSERT INTO notifications (message, kind, icon, document_id, protein_id, comment_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(notification.message.as_str())
    .bind(notification.kind.as_str())
    .bind(notification.icon.as_str())
    .bind(document_id)
    .bind(protein_id)
    .bind(comment_id)
    .bind(now)
    .execute(executor)
    .await
    .map_err(db_err)?
    .last_insert_rowid();

    tracing::debug!(notification_id = id, target = %notification.target, "notification recorded");
    Ok(Notification {
        id,
        message: notification.message,
        kind: notification.kind,
        target: notification.target,
        icon: notification.icon,
        created_at: now,
    })
}

#[async_trait]
impl ContentRepo for SqliteStore {
    async fn create_document(&self, author: DbId, document: NewDocument) -> Result<Document> {
        ensure_valid(&document)?;
        let now = Utc::now();

        let id = sqlx::query(
            "INSERT INTO documents (content, created_by, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(document.content.as_deref())
        .bind(author)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        tracing::info!(document_id = id, author, "document created");
        Ok(Document {
            id,
            content: document.content,
            created_by: author,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_document(&self, id: DbId) -> Result<Option<Document>> {
        sqlx::query(
            "SELECT id, content, created_by, created_at, updated_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(|row| document_from_row(&row))
        .transpose()
        .map_err(db_err)
    }

    async fn delete_document(&self, id: DbId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn create_protein(&self, author: DbId, protein: NewProtein) -> Result<Protein> {
        ensure_valid(&protein)?;
        let now = Utc::now();

        let id = sqlx::query(
            "INSERT INTO proteins (aa_seq, dna_seq, content, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(protein.aa_seq.as_str())
        .bind(protein.dna_seq.as_str())
        .bind(protein.content.as_deref())
        .bind(author)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        tracing::info!(protein_id = id, author, aa_len = protein.aa_seq.len(), "protein created");
        Ok(Protein {
            id,
            aa_seq: protein.aa_seq,
            dna_seq: protein.dna_seq,
            content: protein.content,
            created_by: author,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_protein(&self, id: DbId) -> Result<Option<Protein>> {
        sqlx::query(
            "SELECT id, aa_seq, dna_seq, content, created_by, created_at, updated_at FROM proteins WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(|row| protein_from_row(&row))
        .transpose()
        .map_err(db_err)
    }

    async fn delete_protein(&self, id: DbId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM proteins WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn resolve(&self, target: ContentRef) -> Result<Option<ContentObject>> {
        Ok(match target {
            ContentRef::Document(id) => self.get_document(id).await?.map(ContentObject::Document),
            ContentRef::Protein(id) => self.get_protein(id).await?.map(ContentObject::Protein),
        })
    }

    async fn add_comment(
        &self,
        author: DbId,
        target: ContentRef,
        comment: NewComment,
    ) -> Result<Comment> {
        ensure_valid(&comment)?;
        let now = Utc::now();
        let (document_id, protein_id) = content_columns(target);

        // The lookup stays outside the write transaction; see
        // `create_topic_with_post`.
        if !target_exists(&self.pool, target.into()).await.map_err(db_err)? {
            return Err(AppError::not_found(entity_name(target.into()), target.id()));
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let id = sqlx::query(
            "INSERT INTO comments (comm, document_id, protein_id, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.comm.as_str())
        .bind(document_id)
        .bind(protein_id)
        .bind(author)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        let notice = NewNotification {
            message: format!("New comment on {target}"),
            kind: "comment".into(),
            target: NotificationTarget::Comment(id),
            icon: "comment".into(),
        };
        insert_notification(&mut *tx, notice, now).await?;

        tx.commit().await.map_err(db_err)?;
        tracing::info!(comment_id = id, %target, author, "comment added");

        Ok(Comment {
            id,
            comm: comment.comm,
            target,
            created_by: author,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list_comments(&self, target: ContentRef) -> Result<Vec<Comment>> {
        let column = match target {
            ContentRef::Document(_) => "document_id",
            ContentRef::Protein(_) => "protein_id",
        };
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE {column} = ? ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(target.id())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(comment_from_row)
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }

    async fn create_notification(&self, notification: NewNotification) -> Result<Notification> {
        ensure_valid(&notification)?;
        let target = notification.target;

        if !target_exists(&self.pool, target).await.map_err(db_err)? {
            return Err(AppError::not_found(entity_name(target), target.id()));
        }
        insert_notification(&self.pool, notification, Utc::now()).await
    }

    async fn list_notifications(&self, limit: i64) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY created_at DESC, id DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(notification_from_row)
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }
}
