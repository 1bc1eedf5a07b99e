//! Bearer API key authentication.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::AppState;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

pub fn error_response(status: StatusCode, error: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(key) => key,
            None => {
                return error_response(
                    StatusCode::UNAUTHORIZED,
                    "invalid_auth",
                    "Authorization header must use Bearer scheme",
                );
            }
        },
        None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authorization header required",
            );
        }
    };

    match state.api_keys.validate(api_key) {
        Some(client) => {
            request.extensions_mut().insert(client);
            next.run(request).await
        }
        None => error_response(StatusCode::UNAUTHORIZED, "invalid_key", "Invalid API key"),
    }
}
