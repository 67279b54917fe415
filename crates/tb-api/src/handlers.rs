//! # tb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.

use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use tb_core::error::AppError;
use tb_core::forms::{FormErrors, NewTopicForm};
use tb_core::models::{Board, DbId};
use tb_ui::{HomeTemplate, InputTemplate, NewTopicTemplate, TestTemplate, TopicsTemplate};

use crate::error::ApiResult;
use crate::extract::{BoardId, Caller};
use crate::state::AppState;

async fn load_board(state: &AppState, board_id: DbId) -> ApiResult<Board> {
    state
        .boards
        .get_board(board_id)
        .await?
        .ok_or_else(|| AppError::not_found("Board", board_id).into())
}

/// GET /
pub async fn home(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let boards = state.boards.list_boards().await?;
    Ok(Html(HomeTemplate { boards: &boards }.render()?))
}

/// GET /about
pub async fn about() -> &'static str {
    "topicboard: boards, topics and posts."
}

/// GET /boards/{board_id}/
pub async fn board_topics(
    State(state): State<AppState>,
    BoardId(board_id): BoardId,
) -> ApiResult<Html<String>> {
    let board = load_board(&state, board_id).await?;
    let topics = state.boards.list_topics(board.id).await?;

    let html = TopicsTemplate {
        board: &board,
        topics: &topics,
    }
    .render()?;
    Ok(Html(html))
}

/// GET /boards/{board_id}/new/
pub async fn new_topic_form(
    State(state): State<AppState>,
    BoardId(board_id): BoardId,
) -> ApiResult<Html<String>> {
    let board = load_board(&state, board_id).await?;
    let form = NewTopicForm::default();
    let errors = FormErrors::default();
    Ok(Html(NewTopicTemplate::new(&board, &form, &errors).render()?))
}

/// POST /boards/{board_id}/new/
///
/// Validates the form, then stores the topic and its first post in one write
/// authored by the caller. Invalid input re-renders the form with the
/// submitted values and per-field messages.
pub async fn create_topic(
    State(state): State<AppState>,
    Caller(author): Caller,
    BoardId(board_id): BoardId,
    Form(form): Form<NewTopicForm>,
) -> ApiResult<Response> {
    let board = load_board(&state, board_id).await?;

    let topic = match form.clean() {
        Ok(topic) => topic,
        Err(errors) => {
            tracing::debug!(board_id, %errors, "topic form rejected");
            let html = NewTopicTemplate::new(&board, &form, &errors).render()?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let (topic, post) = state
        .boards
        .create_topic_with_post(board.id, author.id, topic)
        .await?;
    tracing::info!(
        board_id = board.id,
        topic_id = topic.id,
        post_id = post.id,
        author = %author.username,
        "topic posted"
    );

    Ok(Redirect::to(&format!("/boards/{}/", board.id)).into_response())
}

/// GET /input/
///
/// Content submission is not open; the page is informational only.
pub async fn input_type() -> ApiResult<Html<String>> {
    Ok(Html(InputTemplate.render()?))
}

/// GET /test/
pub async fn test_page() -> ApiResult<Html<String>> {
    Ok(Html(TestTemplate.render()?))
}

/// GET /healthz
pub async fn health(State(state): State<AppState>) -> ApiResult<&'static str> {
    state.boards.ping().await?;
    Ok("ok")
}
