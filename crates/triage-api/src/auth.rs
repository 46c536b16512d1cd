//! Bearer-token authentication for session routes.
//!
//! The token comes from `server.api_token` in config or is generated once
//! at start-up; requests must carry `Authorization: Bearer <token>`.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;

use crate::state::AppState;

/// Generate a random 32-character hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

/// The configured token, or a fresh one when the config leaves it empty.
pub fn resolve_token(configured: &str) -> String {
    let configured = configured.trim();
    if configured.is_empty() {
        let token = generate_token();
        tracing::info!(token = %token, "Generated API token for this run");
        token
    } else {
        configured.to_string()
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

/// Middleware that validates Bearer token authentication.
///
/// Returns 401 if the header is missing, not valid UTF-8, or carries the
/// wrong token.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(value) = req.headers().get("authorization") else {
        return unauthorized("Missing Authorization header");
    };

    let Ok(value) = value.to_str() else {
        return unauthorized("Invalid Authorization header encoding");
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if token == state.api_token => next.run(req).await,
        _ => unauthorized("Invalid bearer token"),
    }
}
