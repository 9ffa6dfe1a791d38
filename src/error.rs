use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failure taxonomy for license operations.
///
/// Each variant maps to one stable status code so automated clients can
/// branch on outcomes. `Pool` is the only kind worth retrying; every other
/// variant is terminal for the request that produced it.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("License is suspended")]
    Suspended,

    #[error("License has expired")]
    Expired,

    #[error("License is bound to another device")]
    DeviceMismatch,

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Suspended => StatusCode::LOCKED,
            AppError::Expired => StatusCode::GONE,
            AppError::DeviceMismatch => StatusCode::FORBIDDEN,
            AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-facing label and optional detail. Infrastructure faults keep
    /// their detail in the server log only.
    fn public_label(&self) -> (&'static str, Option<String>) {
        match self {
            AppError::NotFound(msg) => ("Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => ("Bad request", Some(msg.clone())),
            AppError::Unauthorized => ("Unauthorized", None),
            AppError::Suspended => ("License suspended", None),
            AppError::Expired => ("License expired", None),
            AppError::DeviceMismatch => ("Device mismatch", None),
            AppError::DuplicateKey(msg) => ("Duplicate key", Some(msg.clone())),
            AppError::Database(_) | AppError::Internal(_) => ("Internal server error", None),
            AppError::Pool(_) => ("Store unavailable", None),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Pool(e) => tracing::error!("Connection pool error: {e}"),
            AppError::Internal(msg) => tracing::error!("Internal error: {msg}"),
            _ => {}
        }

        let (error, details) = self.public_label();
        let body = ErrorBody {
            error: error.to_string(),
            details,
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
