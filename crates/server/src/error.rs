//! Relay endpoint errors and their JSON responses.
//!
//! Every error answers with the relay failure envelope,
//! `{ "error": "<message>" }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mathbot_core::RelayError;
use mathbot_core::relay::RelayFailure;

/// Error returned by the relay endpoint.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - the body is not a relay request.
    BadRequest,
    /// 405 Method Not Allowed - anything but `POST`.
    MethodNotAllowed,
    /// 500 Internal Server Error - the relay call failed.
    Relay(RelayError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest => (
                StatusCode::BAD_REQUEST,
                RelayFailure {
                    error: "Invalid request body".to_owned(),
                },
            ),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                RelayFailure {
                    error: "Method Not Allowed".to_owned(),
                },
            ),
            ApiError::Relay(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_failure())
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        ApiError::Relay(err)
    }
}
