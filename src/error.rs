use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::views;

/// Failures that abort a request. Validation problems never end up here; they
/// are rendered back onto the originating form by the handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("anti-forgery token missing or mismatched")]
    PageExpired,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            // Non-standard, but what browsers of form-based apps expect.
            AppError::PageExpired => {
                StatusCode::from_u16(419).unwrap_or(StatusCode::FORBIDDEN)
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::PageExpired => (status, Html(views::page_expired())).into_response(),
            AppError::Internal(e) => {
                error!(error = ?e, "request failed");
                (status, "Internal Server Error").into_response()
            }
        }
    }
}
