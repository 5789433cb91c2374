//! Request signing.
//!
//! A game server signs each command by sending
//! `Sign: lowercase_hex(md5(body ‖ api_key))`. The middleware recomputes
//! the digest over the exact body bytes it received and rejects the
//! request before any command parsing happens.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use wallet_ledger::config::{MAX_BODY_BYTES, SIGN_HEADER};
use wallet_ledger::ErrorCode;

use super::envelope::{CommandHeader, ProcessResponse};
use super::AppState;

/// The `Sign` header value for `body` under `api_key`.
pub fn compute_sign(body: &[u8], api_key: &str) -> String {
    let mut ctx = md5::Context::new();
    ctx.consume(body);
    ctx.consume(api_key.as_bytes());
    format!("{:x}", ctx.compute())
}

/// Checks `provided` against the expected signature without an early exit
/// on the first differing byte.
pub fn verify(body: &[u8], api_key: &str, provided: &[u8]) -> bool {
    constant_time_eq(compute_sign(body, api_key).as_bytes(), provided)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware for the command route. Buffers the body, verifies the
/// signature, then hands the same bytes on to the handler.
pub async fn check_sign(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read request body");
            return reject(&state, String::new(), ErrorCode::ReadBody);
        }
    };

    let api = CommandHeader::peek(&bytes);

    let provided = match parts.headers.get(SIGN_HEADER) {
        Some(value) if !value.is_empty() => value.as_bytes(),
        _ => {
            tracing::warn!(api = %api, "request without signature");
            return reject(&state, api, ErrorCode::SignEmpty);
        }
    };

    if !verify(&bytes, &state.api_key, provided) {
        tracing::warn!(api = %api, "request signature mismatch");
        return reject(&state, api, ErrorCode::SignInvalid);
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn reject(state: &AppState, api: String, code: ErrorCode) -> Response {
    state
        .metrics
        .commands_total
        .with_label_values(&["unauthenticated", code.as_str()])
        .inc();
    (StatusCode::BAD_REQUEST, Json(ProcessResponse::failure(api, code))).into_response()
}
