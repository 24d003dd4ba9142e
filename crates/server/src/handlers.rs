//! Route handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use mathbot_core::RelayError;
use mathbot_core::relay::{RelayRequest, RelaySuccess};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/chat`
///
/// The credential is checked before the body is even parsed, so a server
/// without one fails every call the same way.
pub async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RelaySuccess>, ApiError> {
    let Some(relay) = &state.relay else {
        error!("relay call rejected: no upstream credential configured");
        return Err(RelayError::missing_credential().into());
    };

    let request: RelayRequest = serde_json::from_slice(&body).map_err(|err| {
        debug!("invalid relay request: {err}");
        ApiError::BadRequest
    })?;

    let success = relay.complete(request).await?;
    Ok(Json(success))
}

/// Fallback for any method other than `POST` on the relay route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
