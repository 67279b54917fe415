//! # AppError
//!
//! Centralized error handling for topicboard.
//! Maps domain-specific failures to actionable error types.

use std::fmt;

use thiserror::Error;

/// The primary error type for all tb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Board, Topic, Document)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Validation failure (e.g., subject too long, empty comment)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing or rejected caller credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down, pool exhausted)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate board name)
    #[error("conflict: {0}")]
    Conflict(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        AppError::NotFound(entity, id.to_string())
    }
}

/// A specialized Result type for topicboard logic.
pub type Result<T> = std::result::Result<T, AppError>;
