// src/error.rs
use std::fmt;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorBody;
use crate::services::{chat_store::StoreError, completion::CompletionError};

pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const PERSISTENCE_FAILED_MESSAGE: &str = "Failed to update chat title";
pub const ORIGIN_REJECTED_MESSAGE: &str =
    "The CORS policy for this site does not allow access from the specified Origin.";
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

/// Which relay operation an upstream failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Reply,
    Title,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::Reply => "AI reply generation failed",
            Operation::Title => "Chat title generation failed",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Reply => f.write_str("reply generation"),
            Operation::Title => f.write_str("title generation"),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("upstream rate limited: {0}")]
    UpstreamRateLimited(#[source] CompletionError),

    #[error("{operation} failed: {source}")]
    UpstreamFailure {
        operation: Operation,
        #[source]
        source: UpstreamError,
    },

    #[error("chat title not persisted: {0}")]
    PersistenceFailure(#[source] StoreError),

    #[error("origin {0:?} is not allowed")]
    OriginRejected(String),

    #[error("no route matched")]
    NotFound,
}

impl AppError {
    pub fn upstream(operation: Operation, source: impl Into<UpstreamError>) -> Self {
        AppError::UpstreamFailure {
            operation,
            source: source.into(),
        }
    }

    /// Reply endpoint mapping: throttling stays distinguishable from other failures.
    pub fn from_reply_failure(err: CompletionError) -> Self {
        if err.is_rate_limited() {
            AppError::UpstreamRateLimited(err)
        } else {
            AppError::upstream(Operation::Reply, err)
        }
    }

    pub fn from_store_failure(err: StoreError) -> Self {
        if err.is_rejection() {
            AppError::PersistenceFailure(err)
        } else {
            AppError::upstream(Operation::Title, err)
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamRateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::UpstreamFailure { .. } | AppError::PersistenceFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::OriginRejected(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Message safe to hand to the caller. Upstream detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::UpstreamRateLimited(_) => RATE_LIMITED_MESSAGE.to_string(),
            AppError::UpstreamFailure { operation, .. } => operation.failure_message().to_string(),
            AppError::PersistenceFailure(_) => PERSISTENCE_FAILED_MESSAGE.to_string(),
            AppError::OriginRejected(_) => ORIGIN_REJECTED_MESSAGE.to_string(),
            AppError::NotFound => NOT_FOUND_MESSAGE.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Validation(_) | AppError::NotFound => {
                tracing::debug!("client error: {}", self)
            }
            AppError::OriginRejected(_) => tracing::warn!("{}", self),
            AppError::UpstreamRateLimited(_) => tracing::warn!("{}", self),
            AppError::UpstreamFailure { .. } | AppError::PersistenceFailure(_) => {
                tracing::error!("server error: {}", self)
            }
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
