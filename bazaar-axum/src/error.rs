use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bazaar::Error;
use bazaar::error::{AuthError, StorageError};
use serde_json::json;

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(err) => match err {
                Error::Validation(_) => StatusCode::BAD_REQUEST,
                Error::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
                Error::Auth(AuthError::TooManyAttempts { .. } | AuthError::InvalidPassword) => {
                    StatusCode::FORBIDDEN
                }
                Error::Auth(AuthError::PasswordMismatch) => StatusCode::BAD_REQUEST,
                Error::Auth(AuthError::EmailAlreadyTaken) => StatusCode::CONFLICT,
                Error::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
                Error::Storage(_) | Error::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            match &self {
                ApiError::Service(Error::Auth(err)) => err.to_string(),
                ApiError::Service(Error::Validation(err)) => err.to_string(),
                ApiError::Service(Error::Storage(StorageError::NotFound)) => {
                    "Not found".to_string()
                }
                other => other.to_string(),
            }
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        let mut response = (status, body).into_response();

        if let ApiError::Service(Error::Auth(AuthError::TooManyAttempts { retry_after })) = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }

        response
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
