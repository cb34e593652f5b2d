//! HTTP error type and status mapping.
//!
//! Every failure body is the single-key envelope `{"error": "<message>"}`.

use albums_core::{DbError, RepoError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Unknown id, or a path id that is not a positive integer.
    NotFound,
    /// Malformed JSON, wrong body shape, or a value the columns cannot hold.
    BadRequest(String),
    /// The row disappeared between fetch and write.
    Conflict(String),
    /// The whole request ran past the request timeout.
    Timeout,
    /// Storage failure, timeout, or a crashed blocking task.
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::NotFound => "the requested resource could not be found".to_string(),
            Self::BadRequest(message) => message.clone(),
            Self::Conflict(_) => {
                "unable to update the record due to an edit conflict, please try again"
                    .to_string()
            }
            Self::Timeout => "the server took too long to process your request".to_string(),
            Self::Internal(_) => {
                "the server encountered a problem and could not process your request".to_string()
            }
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for ApiError {}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::RecordNotFound(_) => Self::NotFound,
            RepoError::EditConflict(_) => Self::Conflict(err.to_string()),
            RepoError::Validation(inner) => Self::BadRequest(inner.to_string()),
            RepoError::Db(DbError::Timeout) => Self::Internal("storage timeout".to_string()),
            RepoError::Db(_) | RepoError::InvalidData(_) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use albums_core::AlbumValidationError;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::BadRequest("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("x".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::Internal("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repo_error_mapping() {
        assert_eq!(ApiError::from(RepoError::RecordNotFound(9)), ApiError::NotFound);
        assert!(matches!(
            ApiError::from(RepoError::EditConflict(9)),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(RepoError::Validation(AlbumValidationError::PriceOutOfRange(
                5000.0
            ))),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(RepoError::Db(DbError::Timeout)),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = ApiError::Internal("disk I/O error at /var/db".to_string());
        assert!(!err.public_message().contains("/var/db"));
    }
}
