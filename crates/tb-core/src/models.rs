//! # Domain Models
//!
//! These structs represent the core entities of topicboard.
//! Rows are keyed by the store's integer row ids.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary key type shared by every table.
pub type DbId = i64;

/// An author account. Every topic, post, document, protein and comment
/// belongs to one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    /// Argon2 PHC string; never rendered.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A named container of topics (e.g. "General").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: DbId,
    /// Unique across all boards.
    pub name: String,
    pub description: String,
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A discussion thread within a Board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: DbId,
    pub subject: String,
    pub board_id: DbId,
    pub created_by: DbId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A topic as listed on its board page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic: Topic,
    /// Username of `topic.created_by`.
    pub author: String,
    pub post_count: i64,
}

/// A message within a Topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: DbId,
    pub message: String,
    pub topic_id: DbId,
    pub created_by: DbId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DbId,
    pub content: Option<String>,
    pub created_by: DbId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content.as_deref().unwrap_or_default())
    }
}

/// A protein record: amino-acid sequence plus its coding DNA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protein {
    pub id: DbId,
    pub aa_seq: String,
    pub dna_seq: String,
    pub content: Option<String>,
    pub created_by: DbId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Protein {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content.as_deref().unwrap_or_default())
    }
}

/// The closed set of entities a Comment can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ContentRef {
    Document(DbId),
    Protein(DbId),
}

impl ContentRef {
    pub fn id(&self) -> DbId {
        match *self {
            ContentRef::Document(id) | ContentRef::Protein(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContentRef::Document(_) => "document",
            ContentRef::Protein(_) => "protein",
        }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind(), self.id())
    }
}

/// A resolved [`ContentRef`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContentObject {
    Document(Document),
    Protein(Protein),
}

impl ContentObject {
    pub fn reference(&self) -> ContentRef {
        match self {
            ContentObject::Document(d) => ContentRef::Document(d.id),
            ContentObject::Protein(p) => ContentRef::Protein(p.id),
        }
    }
}

/// A short remark attached to a document or protein.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: DbId,
    pub comm: String,
    pub target: ContentRef,
    pub created_by: DbId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Anything a Notification may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum NotificationTarget {
    Document(DbId),
    Protein(DbId),
    Comment(DbId),
}

impl NotificationTarget {
    pub fn id(&self) -> DbId {
        match *self {
            NotificationTarget::Document(id)
            | NotificationTarget::Protein(id)
            | NotificationTarget::Comment(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NotificationTarget::Document(_) => "document",
            NotificationTarget::Protein(_) => "protein",
            NotificationTarget::Comment(_) => "comment",
        }
    }
}

impl From<ContentRef> for NotificationTarget {
    fn from(target: ContentRef) -> Self {
        match target {
            ContentRef::Document(id) => NotificationTarget::Document(id),
            ContentRef::Protein(id) => NotificationTarget::Protein(id),
        }
    }
}

impl fmt::Display for NotificationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind(), self.id())
    }
}

/// An event record pointing at a document, protein or comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: DbId,
    pub message: String,
    /// Free-form category (e.g. "comment").
    pub kind: String,
    pub target: NotificationTarget,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}
