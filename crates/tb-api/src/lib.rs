//! # tb-api
//!
//! The web routing and orchestration layer for topicboard.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::middleware::map_response_with_state;
use axum::routing::get;
use axum::Router;

pub use error::{ApiError, ApiResult};
pub use extract::{BoardId, Caller};
pub use state::AppState;

/// Builds the full application router.
///
/// # Developer Note
/// Paths keep their trailing slash; `/boards/1` and `/boards/1/` are
/// different routes.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        // The board list
        .route("/", get(handlers::home))
        .route("/about", get(handlers::about))
        .route("/healthz", get(handlers::health))
        // A board and its topics
        .route("/boards/{board_id}/", get(handlers::board_topics))
        // The topic form
        .route(
            "/boards/{board_id}/new/",
            get(handlers::new_topic_form).post(handlers::create_topic),
        )
        .route("/input/", get(handlers::input_type))
        .route("/test/", get(handlers::test_page))
        .layer(map_response_with_state(
            state.clone(),
            middleware::challenge_unauthorized,
        ))
        .with_state(state);

    middleware::standard_middleware(routes)
}
