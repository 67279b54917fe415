use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tb_core::error::AppError;

/// Handler-level error: domain failures plus template rendering.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] AppError),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `WWW-Authenticate` value for `realm`.
pub fn basic_challenge(realm: &str) -> String {
    format!("Basic realm=\"{realm}\", charset=\"UTF-8\"")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Core(core) => match core {
                AppError::NotFound(..) => (StatusCode::NOT_FOUND, core.to_string()),
                AppError::ValidationError(_) => (StatusCode::UNPROCESSABLE_ENTITY, core.to_string()),
                AppError::Conflict(_) => (StatusCode::CONFLICT, core.to_string()),
                // The challenge header is added by the router, which knows the realm.
                AppError::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, reason),
                AppError::Internal(msg) => {
                    tracing::error!(error = %msg, "internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal error occurred".to_string(),
                    )
                }
            },
            ApiError::Render(err) => {
                tracing::error!(error = %err, "template rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
