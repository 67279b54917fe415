//! Request extractors: caller identity and board ids.

use axum::extract::{FromRequestParts, Path, RawPathParams};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tb_core::error::AppError;
use tb_core::models::{DbId, User};

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated user making the request.
///
/// Handlers that write take this as a parameter, so the author of every row
/// is whoever sent the credentials:
///
/// ```ignore
/// async fn handler(Caller(user): Caller) -> String {
///     user.username
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Caller(pub User);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing credentials".into()))?;

        let user = state.auth.authenticate(header).await?;
        tracing::debug!(user_id = user.id, "caller authenticated");
        Ok(Caller(user))
    }
}

/// The `{board_id}` path segment.
///
/// Anything that is not a valid id cannot name a board, so it is answered
/// with 404 like any other unknown board.
#[derive(Debug, Clone, Copy)]
pub struct BoardId(pub DbId);

impl<S> FromRequestParts<S> for BoardId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<DbId>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(BoardId(id)),
            Err(rejection) => {
                let raw = RawPathParams::from_request_parts(parts, state)
                    .await
                    .ok()
                    .and_then(|params| {
                        params
                            .iter()
                            .find(|(key, _)| *key == "board_id")
                            .map(|(_, value)| value.to_owned())
                    })
                    .unwrap_or_default();
                tracing::debug!(%raw, %rejection, "unparseable board id");
                Err(AppError::not_found("Board", raw).into())
            }
        }
    }
}
