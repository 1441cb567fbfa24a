use crate::{auth::AuthError, repository::RepositoryError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// ErrorBody
///
/// The single error envelope every failing request receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

/// ApiError
///
/// Abstract failure kinds a handler can end in. Each maps to a fixed status and message,
/// except `Auth`, which carries both from the authorization layer.
#[derive(Debug)]
pub enum ApiError {
    BadRequest,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    Unprocessable,
    Auth(AuthError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Auth(err) => err.status,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let message = match self {
            ApiError::BadRequest => "bad request".to_string(),
            // Spelling is part of the public contract.
            ApiError::Unauthorized => "Unathorized".to_string(),
            ApiError::NotFound => "resource not found".to_string(),
            ApiError::MethodNotAllowed => "method not allowed".to_string(),
            ApiError::Unprocessable => "unprocessable".to_string(),
            ApiError::Auth(err) => err.description.clone(),
        };
        ErrorBody {
            success: false,
            error: self.status().as_u16(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

/// Route-specific translation of store failures happens in the handlers; this is the default
/// used by the read paths.
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        tracing::error!("persistence failure: {}", err);
        ApiError::Unprocessable
    }
}

/// Fallback for paths that match no route.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Fallback for a known path requested with a method it does not route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
