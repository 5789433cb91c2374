//! # Game-Processor API
//!
//! Builds the axum router that game servers talk to. All endpoints share
//! application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                                    | Description                |
//! |--------|-----------------------------------------|----------------------------|
//! | POST   | `/open-api-games/v1/games-processor`    | Signed command endpoint    |
//! | GET    | `/healthcheck`                          | Liveness probe, plain `OK` |
//!
//! ```text
//! envelope.rs — request/response envelope and command discriminator
//! sign.rs     — Sign header computation and the verifying middleware
//! handler.rs  — command dispatch onto the wallet service
//! ```

pub mod envelope;
pub mod handler;
pub mod sign;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use wallet_ledger::WalletService;

use crate::metrics::SharedMetrics;

/// Path of the signed command endpoint.
pub const PROCESS_PATH: &str = "/open-api-games/v1/games-processor";

/// Path of the liveness probe.
pub const HEALTHCHECK_PATH: &str = "/healthcheck";

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub wallet: WalletService,
    pub metrics: SharedMetrics,
    /// Secret appended to the body when computing the `Sign` header.
    pub api_key: Arc<str>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`]. The signature check wraps only the
/// POST handler of the command route, so other methods still get 405 and
/// the healthcheck stays open.
pub fn create_router(state: AppState) -> Router {
    let process = post(handler::process).route_layer(middleware::from_fn_with_state(
        state.clone(),
        sign::check_sign,
    ));

    Router::new()
        .route(HEALTHCHECK_PATH, get(healthcheck))
        .route(PROCESS_PATH, process)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthcheck() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// ---------------------------------------------------------------------------
// Test Support
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wallet_ledger::seed;
    use wallet_ledger::store::MemoryLedger;

    use crate::metrics::WalletMetrics;

    pub const TEST_KEY: &str = "test-api-key";

    /// AppState over a seeded in-memory store.
    pub async fn test_app_state() -> (Arc<MemoryLedger>, AppState) {
        let store = Arc::new(MemoryLedger::new());
        seed::load(store.as_ref()).await.expect("seed");
        let state = AppState {
            wallet: WalletService::new(store.clone()),
            metrics: Arc::new(WalletMetrics::new()),
            api_key: Arc::from(TEST_KEY),
        };
        (store, state)
    }

    /// Sends a request and returns (status, body_bytes).
    pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// POSTs `body` to the command route with an optional `Sign` header.
    pub async fn post_raw(
        router: &Router,
        body: &[u8],
        sign: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(PROCESS_PATH)
            .header("content-type", "application/json");
        if let Some(sign) = sign {
            builder = builder.header("Sign", sign);
        }
        let req = builder.body(Body::from(body.to_vec())).unwrap();
        let (status, bytes) = send(router, req).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// POSTs a correctly signed JSON command.
    pub async fn post_signed(
        router: &Router,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let bytes = serde_json::to_vec(&body).unwrap();
        let sign = super::sign::compute_sign(&bytes, TEST_KEY);
        post_raw(router, &bytes, Some(&sign)).await
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    #[tokio::test]
    async fn healthcheck_is_open() {
        let (_, state) = test_app_state().await;
        let router = create_router(state);
        let req = Request::builder()
            .uri(HEALTHCHECK_PATH)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn command_route_rejects_get() {
        let (store, state) = test_app_state().await;
        let router = create_router(state);
        let req = Request::builder()
            .uri(PROCESS_PATH)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, req).await;

        // Method mismatch wins over the missing signature.
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(!String::from_utf8_lossy(&body).contains("SIGN_NOT_PROVIDED"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn unsigned_post_still_hits_the_gate() {
        let (_, state) = test_app_state().await;
        let router = create_router(state);
        let (status, body) = post_raw(&router, br#"{"api":"balance"}"#, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "SIGN_NOT_PROVIDED");
    }
}
