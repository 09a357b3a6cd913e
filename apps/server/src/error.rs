//! Server error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use talentry_intake::DecodeError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    InvalidUpload(String),

    #[error("Unsupported file type '{0}'. Only JSON and CSV are allowed.")]
    UnsupportedMediaType(String),

    #[error("Candidate not found: {0}")]
    CandidateNotFound(i64),

    #[error("Duplicate candidate (MailId + SkillSet + AvailabilityDate)")]
    DuplicateCandidate,

    #[error("Batch too large: {received} rows (limit {limit})")]
    BatchTooLarge { received: usize, limit: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedFormat(format) => Error::UnsupportedMediaType(format),
            other => Error::InvalidUpload(format!("Invalid file content: {other}")),
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidUpload(_) | Error::BatchTooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::CandidateNotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateCandidate => StatusCode::CONFLICT,
            Error::Database(_) | Error::Migration(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Error::Validation(errors) => json!({
                "message": "Validation failed.",
                "errors": errors,
            }),
            Error::Database(e) => {
                tracing::error!(error = %e, "database error");
                json!({ "message": "An internal error occurred." })
            }
            Error::Migration(e) => {
                tracing::error!(error = %e, "migration error");
                json!({ "message": "An internal error occurred." })
            }
            Error::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                json!({ "message": "An internal error occurred." })
            }
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
