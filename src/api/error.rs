use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

/// Client errors carry their message; provider failures pass the upstream
/// message through; storage failures are logged and reported generically.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            log::debug!("Rejected request: {}", self);
        }

        let (status, detail) = match &self {
            Error::Validation(_)
            | Error::MissingCredential(_)
            | Error::OwnershipMismatch { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Error::Provider(msg) => {
                log::error!("Provider error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            Error::Storage(err) => {
                log::error!("Storage error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
