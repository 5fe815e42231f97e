use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Data access error: {0}")]
    DalError(#[from] lingo_dal::Error),

    #[error("Token error: {0}")]
    TokenError(#[from] lingo_auth::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Not allowed to access this resource")]
    Forbidden,
}

/// JSON error body, `{ statusCode, error, message }`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DalError(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::DalError(e) if e.is_unique_violation() => StatusCode::CONFLICT,
            ApiError::DalError(lingo_dal::Error::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::DalError(
                lingo_dal::Error::IncompleteTranslation(_) | lingo_dal::Error::InvalidOrderByField(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::DalError(_) | ApiError::TokenError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            debug!("Request rejected with {status}: {self}");
            match &self {
                ApiError::DalError(lingo_dal::Error::DatabaseError(_)) => {
                    // do not leak SQL details
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                }
                _ => self.to_string(),
            }
        };
        let body = ErrorBody {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or_default().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
