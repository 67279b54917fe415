//! # seed
//!
//! Loads development fixtures (users, boards, documents, proteins and their
//! comments) from a TOML file into the configured database.
//!
//! Usage: `seed [path/to/fixture.toml]` (default `config/seed.toml`).
//! Existing users and boards are reused on a re-run. Documents, proteins
//! and their comments have no natural key and are added again each run.

use std::collections::HashMap;

use anyhow::{bail, Context};
use config::{Config, File};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tb_auth_simple::hash_password;
use tb_config::Settings;
use tb_core::error::AppError;
use tb_core::forms::{NewBoard, NewComment, NewDocument, NewProtein, NewUser};
use tb_core::models::{ContentRef, DbId};
use tb_core::traits::{BoardRepo, ContentRepo, UserRepo};
use tb_db_sqlite::SqliteStore;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    users: Vec<UserFixture>,
    #[serde(default)]
    boards: Vec<NewBoard>,
    #[serde(default)]
    documents: Vec<DocumentFixture>,
    #[serde(default)]
    proteins: Vec<ProteinFixture>,
}

#[derive(Debug, Deserialize)]
struct UserFixture {
    username: String,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentFixture {
    author: String,
    comm: String,
}

#[derive(Debug, Deserialize)]
struct DocumentFixture {
    author: String,
    content: Option<String>,
    #[serde(default)]
    comments: Vec<CommentFixture>,
}

#[derive(Debug, Deserialize)]
struct ProteinFixture {
    author: String,
    aa_seq: String,
    dna_seq: String,
    content: Option<String>,
    #[serde(default)]
    comments: Vec<CommentFixture>,
}

struct Authors(HashMap<String, DbId>);

impl Authors {
    fn id(&self, username: &str) -> anyhow::Result<DbId> {
        self.0
            .get(username)
            .copied()
            .with_context(|| format!("fixture references unknown author {username:?}"))
    }
}

async fn seed_users(
    store: &SqliteStore,
    settings: &Settings,
    users: Vec<UserFixture>,
) -> anyhow::Result<Authors> {
    let mut authors = HashMap::new();
    for user in users {
        if let Some(existing) = store.find_by_username(&user.username).await? {
            tracing::info!(username = %user.username, "user exists, skipping");
            authors.insert(user.username, existing.id);
            continue;
        }

        let password = match (user.password, &settings.seed.admin_password) {
            (Some(password), _) => password,
            (None, Some(secret)) => secret.expose_secret().to_string(),
            (None, None) => bail!(
                "user {:?} has no password and seed.admin_password is unset",
                user.username
            ),
        };

        let created = store
            .create_user(NewUser {
                username: user.username.clone(),
                password_hash: hash_password(&password)?,
            })
            .await?;
        tracing::info!(user_id = created.id, username = %created.username, "user seeded");
        authors.insert(user.username, created.id);
    }
    Ok(Authors(authors))
}

async fn seed_comments(
    store: &SqliteStore,
    authors: &Authors,
    target: ContentRef,
    comments: Vec<CommentFixture>,
) -> anyhow::Result<()> {
    for comment in comments {
        let author = authors.id(&comment.author)?;
        store
            .add_comment(author, target, NewComment { comm: comment.comm })
            .await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/seed.toml".to_string());

    let settings = Settings::load().context("loading settings")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log.filter))
        .init();

    let fixture: Fixture = Config::builder()
        .add_source(File::with_name(&path))
        .build()
        .and_then(Config::try_deserialize)
        .with_context(|| format!("reading fixture {path}"))?;

    let store = SqliteStore::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("opening database")?;

    let authors = seed_users(&store, &settings, fixture.users).await?;

    for board in fixture.boards {
        let name = board.name.clone();
        match store.create_board(board).await {
            Ok(created) => tracing::info!(board_id = created.id, %name, "board seeded"),
            Err(AppError::Conflict(_)) => tracing::info!(%name, "board exists, skipping"),
            Err(err) => return Err(err.into()),
        }
    }

    for document in fixture.documents {
        let author = authors.id(&document.author)?;
        let created = store
            .create_document(
                author,
                NewDocument {
                    content: document.content,
                },
            )
            .await?;
        seed_comments(&store, &authors, ContentRef::Document(created.id), document.comments)
            .await?;
    }

    for protein in fixture.proteins {
        let author = authors.id(&protein.author)?;
        let created = store
            .create_protein(
                author,
                NewProtein {
                    aa_seq: protein.aa_seq,
                    dna_seq: protein.dna_seq,
                    content: protein.content,
                },
            )
            .await?;
        seed_comments(&store, &authors, ContentRef::Protein(created.id), protein.comments)
            .await?;
    }

    let notifications = store.list_notifications(5).await?;
    tracing::info!(recent_notifications = notifications.len(), "seed complete");
    Ok(())
}
