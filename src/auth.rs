use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{errors::AppError, AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Guards the record routes when an API key is configured; open otherwise.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let Some(provided) = request.headers().get(API_KEY_HEADER) else {
        return Err(AppError::unauthorized(
            "missing_api_key",
            "missing X-API-Key header",
        ));
    };

    if provided.as_bytes() != expected.as_bytes() {
        return Err(AppError::unauthorized("invalid_api_key", "invalid API key"));
    }

    Ok(next.run(request).await)
}
