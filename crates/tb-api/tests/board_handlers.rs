//! End-to-end handler tests against an in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use tb_api::{router, AppState};
use tb_auth_simple::{hash_password, SimpleAuthProvider};
use tb_core::error::AppError;
use tb_core::forms::{NewBoard, NewUser};
use tb_core::traits::{BoardRepo, MockAuthProvider, MockBoardRepo, UserRepo};
use tb_db_sqlite::SqliteStore;
use tower::ServiceExt;

const FORM: &str = "application/x-www-form-urlencoded";

struct TestApp {
    router: Router,
    store: Arc<SqliteStore>,
    board_id: i64,
    author_id: i64,
}

async fn setup() -> TestApp {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let author = store
        .create_user(NewUser {
            username: "alice".into(),
            password_hash: hash_password("s3cret").unwrap(),
        })
        .await
        .unwrap();
    let board = store
        .create_board(NewBoard {
            name: "General".into(),
            description: "General discussion".into(),
        })
        .await
        .unwrap();

    let auth = Arc::new(SimpleAuthProvider::new(store.clone(), "topicboard"));
    let state = AppState::new(store.clone(), auth);

    TestApp {
        router: router(state),
        store,
        board_id: board.id,
        author_id: author.id,
    }
}

fn basic(user: &str, pass: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: String, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, FORM);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn home_lists_boards() {
    let app = setup().await;
    let response = app.router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("General"));
    assert!(html.contains(&format!("/boards/{}/", app.board_id)));
}

#[tokio::test]
async fn about_is_plain_text() {
    let app = setup().await;
    let response = app.router.oneshot(get("/about")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!body_text(response).await.is_empty());
}

#[tokio::test]
async fn unknown_board_is_not_found_everywhere() {
    let app = setup().await;

    let detail = app.router.clone().oneshot(get("/boards/99/")).await.unwrap();
    assert_eq!(detail.status(), StatusCode::NOT_FOUND);

    let form = app.router.clone().oneshot(get("/boards/99/new/")).await.unwrap();
    assert_eq!(form.status(), StatusCode::NOT_FOUND);

    let submit = app
        .router
        .oneshot(post_form(
            "/boards/99/new/",
            "subject=Hello&message=World".into(),
            Some(basic("alice", "s3cret")),
        ))
        .await
        .unwrap();
    assert_eq!(submit.status(), StatusCode::NOT_FOUND);
    assert!(app.store.list_topics(app.board_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn creating_topic_redirects_and_persists_topic_and_post() {
    let app = setup().await;
    let uri = format!("/boards/{}/new/", app.board_id);

    let response = app
        .router
        .clone()
        .oneshot(post_form(
            &uri,
            "subject=Hello&message=World".into(),
            Some(basic("alice", "s3cret")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("/boards/{}/", app.board_id).as_str()
    );

    let topics = app.store.list_topics(app.board_id).await.unwrap();
    assert_eq!(topics.len(), 1);
    let topic = &topics[0].topic;
    assert_eq!(topic.subject, "Hello");
    assert_eq!(topic.board_id, app.board_id);
    assert_eq!(topic.created_by, app.author_id);

    let posts = app.store.list_posts(topic.id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].message, "World");
    assert_eq!(posts[0].created_by, app.author_id);

    // The board page now shows the topic.
    let page = app
        .router
        .oneshot(get(&format!("/boards/{}/", app.board_id)))
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    let html = body_text(page).await;
    assert!(html.contains("Hello"));
    assert!(html.contains("alice"));
}

#[tokio::test]
async fn overlong_fields_rerender_form_without_writing() {
    let app = setup().await;
    let uri = format!("/boards/{}/new/", app.board_id);
    let body = format!("subject={}&message=kept+text", "s".repeat(256));

    let response = app
        .router
        .clone()
        .oneshot(post_form(&uri, body, Some(basic("alice", "s3cret"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("kept text"));
    assert!(html.contains(r#"class="errors""#));

    let body = format!("subject=ok&message={}", "m".repeat(4001));
    let response = app
        .router
        .oneshot(post_form(&uri, body, Some(basic("alice", "s3cret"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert!(app.store.list_topics(app.board_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_fields_are_rejected() {
    let app = setup().await;
    let uri = format!("/boards/{}/new/", app.board_id);
    let response = app
        .router
        .oneshot(post_form(&uri, "subject=+++".into(), Some(basic("alice", "s3cret"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.store.list_topics(app.board_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn posting_requires_credentials() {
    let app = setup().await;
    let uri = format!("/boards/{}/new/", app.board_id);

    let anonymous = app
        .router
        .clone()
        .oneshot(post_form(&uri, "subject=Hello&message=World".into(), None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    let challenge = anonymous.headers()[header::WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.starts_with("Basic realm=\"topicboard\""));

    let wrong = app
        .router
        .oneshot(post_form(
            &uri,
            "subject=Hello&message=World".into(),
            Some(basic("alice", "guess")),
        ))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    assert!(app.store.list_topics(app.board_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_form_renders_for_existing_board() {
    let app = setup().await;
    let response = app
        .router
        .oneshot(get(&format!("/boards/{}/new/", app.board_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="subject""#));
    assert!(html.contains(r#"name="message""#));
}

#[tokio::test]
async fn placeholder_pages_render() {
    let app = setup().await;
    for uri in ["/input/", "/test/"] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let app = setup().await;
    let response = app.router.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn store_failures_are_sanitized() {
    let mut boards = MockBoardRepo::new();
    boards
        .expect_list_boards()
        .returning(|| Err(AppError::Internal("disk I/O error at /var/db".into())));
    let state = AppState::new(Arc::new(boards), Arc::new(MockAuthProvider::new()));

    let response = router(state).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(response).await.contains("/var/db"));
}

#[tokio::test]
async fn malformed_board_ids_are_not_found() {
    let app = setup().await;
    for uri in ["/boards/abc/", "/boards/abc/new/", "/boards/99999999999999999999/"] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let submit = app
        .router
        .oneshot(post_form(
            "/boards/abc/new/",
            "subject=Hello&message=World".into(),
            Some(basic("alice", "s3cret")),
        ))
        .await
        .unwrap();
    assert_eq!(submit.status(), StatusCode::NOT_FOUND);
    assert!(app.store.list_topics(app.board_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn challenges_use_the_configured_realm() {
    let mut boards = MockBoardRepo::new();
    boards
        .expect_list_boards()
        .returning(|| Err(AppError::Unauthorized("board list is private".into())));
    let mut auth = MockAuthProvider::new();
    auth.expect_realm().returning(|| "staff".to_string());
    auth.expect_authenticate()
        .returning(|_| Err(AppError::Unauthorized("invalid credentials".into())));
    let app = router(AppState::new(Arc::new(boards), Arc::new(auth)));

    let listing = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(listing.status(), StatusCode::UNAUTHORIZED);
    let challenge = listing.headers()[header::WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.starts_with("Basic realm=\"staff\""), "{challenge}");

    let submit = app
        .oneshot(post_form(
            "/boards/1/new/",
            "subject=Hello&message=World".into(),
            Some(basic("alice", "guess")),
        ))
        .await
        .unwrap();
    assert_eq!(submit.status(), StatusCode::UNAUTHORIZED);
    let challenge = submit.headers()[header::WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.starts_with("Basic realm=\"staff\""), "{challenge}");
}
