//! Mapping of engine errors to HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error returned by every API handler
#[derive(Debug)]
pub struct ApiError(pub modq_common::Error);

impl From<modq_common::Error> for ApiError {
    fn from(err: modq_common::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use modq_common::Error;

        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Database(sqlx::Error::Database(db_err))
                if db_err.is_foreign_key_violation() || db_err.is_unique_violation() =>
            {
                StatusCode::CONFLICT
            }
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                error!("Request failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}
