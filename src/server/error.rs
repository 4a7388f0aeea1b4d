//! HTTP error responses for the service

use crate::CrawlerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by route handlers
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown run: {0}")]
    RunNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid form field {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error(transparent)]
    Crawler(#[from] CrawlerError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RunNotFound(_) | Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidField { .. } | Self::Crawler(CrawlerError::InvalidRequest(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Crawler(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RunNotFound(_) => "run_not_found",
            Self::FileNotFound(_) => "file_not_found",
            Self::InvalidField { .. } | Self::Crawler(CrawlerError::InvalidRequest(_)) => {
                "invalid_request"
            }
            Self::Crawler(_) | Self::Task(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
