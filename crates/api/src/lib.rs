//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for wallet operations
//! - Request id and tracing middleware
//! - Error-to-response mapping

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use coffer_core::wallet::{BalanceMutator, WalletService, WalletStore};
use coffer_shared::AppError;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1 << 20;

/// The wallet service as seen by handlers, with storage behind trait objects.
pub type WalletOperations = WalletService<Arc<dyn WalletStore>, Arc<dyn BalanceMutator>>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Wallet operation orchestrator.
    pub wallets: Arc<WalletOperations>,
}

impl AppState {
    /// Creates the state from a wallet service.
    #[must_use]
    pub fn new(wallets: WalletOperations) -> Self {
        Self {
            wallets: Arc::new(wallets),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .nest("/api/v1", routes::api_routes())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(trace)
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

async fn not_found() -> ApiError {
    AppError::NotFound("No such route".to_string()).into()
}
