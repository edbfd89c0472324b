use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::prelude::*;
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::models::AdminConfig;

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Decode an `Authorization: Basic ...` header into (username, password).
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value
        .strip_prefix("Basic ")
        .or_else(|| value.strip_prefix("basic "))?;
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub(super) fn check(admin: &AdminConfig, headers: &HeaderMap) -> bool {
    match basic_credentials(headers) {
        Some((user, pass)) => {
            let user_ok = constant_time_eq(user.as_bytes(), admin.username.as_bytes());
            let pass_ok = constant_time_eq(pass.as_bytes(), admin.password.as_bytes());
            user_ok & pass_ok
        }
        None => false,
    }
}

pub(super) async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if check(&state.admin, req.headers()) {
        return next.run(req).await;
    }
    warn!("Rejected admin request to {}", req.uri().path());
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, "Basic")],
        Json(json!({ "detail": "Credenziali errate" })),
    )
        .into_response()
}
