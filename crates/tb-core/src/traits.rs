//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::error::Result;
use crate::forms::{NewBoard, NewComment, NewDocument, NewNotification, NewProtein, NewTopic, NewUser};
use crate::models::{
    Board, Comment, ContentObject, ContentRef, DbId, Document, Notification, Post, Protein, Topic,
    TopicSummary, User,
};

/// Data persistence contract for boards, topics, and posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BoardRepo: Send + Sync {
    // Board Operations
    async fn create_board(&self, board: NewBoard) -> Result<Board>;
    async fn get_board(&self, id: DbId) -> Result<Option<Board>>;
    async fn list_boards(&self) -> Result<Vec<Board>>;
    /// Removes the board together with its topics and their posts.
    async fn delete_board(&self, id: DbId) -> Result<bool>;

    // Topic Operations
    /// Persists the topic and its opening post as one atomic write.
    async fn create_topic_with_post(
        &self,
        board_id: DbId,
        author: DbId,
        topic: NewTopic,
    ) -> Result<(Topic, Post)>;
    async fn get_topic(&self, id: DbId) -> Result<Option<Topic>>;
    /// Newest first.
    async fn list_topics(&self, board_id: DbId) -> Result<Vec<TopicSummary>>;
    async fn delete_topic(&self, id: DbId) -> Result<bool>;

    // Post Operations
    async fn list_posts(&self, topic_id: DbId) -> Result<Vec<Post>>;

    /// Cheap round-trip used by the health endpoint.
    async fn ping(&self) -> Result<()>;
}

/// Author accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user(&self, id: DbId) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Removes the user and every row they authored.
    async fn delete_user(&self, id: DbId) -> Result<bool>;
}

/// Documents, proteins, and everything that hangs off them.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentRepo: Send + Sync {
    async fn create_document(&self, author: DbId, document: NewDocument) -> Result<Document>;
    async fn get_document(&self, id: DbId) -> Result<Option<Document>>;
    async fn delete_document(&self, id: DbId) -> Result<bool>;

    async fn create_protein(&self, author: DbId, protein: NewProtein) -> Result<Protein>;
    async fn get_protein(&self, id: DbId) -> Result<Option<Protein>>;
    async fn delete_protein(&self, id: DbId) -> Result<bool>;

    /// Looks up whatever `target` points at.
    async fn resolve(&self, target: ContentRef) -> Result<Option<ContentObject>>;

    /// Attaches a comment to an existing document or protein and records a
    /// notification for it. Fails with `NotFound` when the target is gone.
    async fn add_comment(
        &self,
        author: DbId,
        target: ContentRef,
        comment: NewComment,
    ) -> Result<Comment>;
    /// Oldest first.
    async fn list_comments(&self, target: ContentRef) -> Result<Vec<Comment>>;

    async fn create_notification(&self, notification: NewNotification) -> Result<Notification>;
    /// Newest first.
    async fn list_notifications(&self, limit: i64) -> Result<Vec<Notification>>;
}

/// Caller identity contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves the raw `Authorization` header value to a known user.
    async fn authenticate(&self, authorization: &str) -> Result<User>;

    /// Realm announced in the `WWW-Authenticate` challenge.
    fn realm(&self) -> String;
}
