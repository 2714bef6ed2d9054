use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::models::{ErrorResponse, ValidationErrorResponse};
use crate::validation::FieldIssue;

/// Errors a handler turns into an HTTP response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("request validation failed")]
    Validation(Vec<FieldIssue>),
    #[error("{detail}")]
    Rejected { status: StatusCode, detail: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::NotFound(detail) | ApiError::Rejected { detail, .. } => {
                (status, Json(ErrorResponse { detail })).into_response()
            }
            ApiError::Validation(detail) => {
                (status, Json(ValidationErrorResponse { detail })).into_response()
            }
            ApiError::Internal(reason) => {
                log::error!("Request failed: {}", reason);
                (
                    status,
                    Json(ErrorResponse {
                        detail: "Internal Server Error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
