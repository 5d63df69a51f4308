use crate::{types::ErrorResponse, validation::ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Failures of an appointment store.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Appointment {0} does not exist")]
    NotFound(Uuid),
    #[error("Database connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Stored appointment is corrupt: {0}")]
    Corrupt(String),
    #[error("Appointment store lock is poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Appointment not found")]
    NotFound,
    #[error("Appointment store failure: {0}")]
    Store(BackendError),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(_) => AppError::NotFound,
            err => AppError::Store(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Store(err) => {
                error!(?err, "Appointment store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
