//! HTTP adapters - REST API implementations.
//!
//! - `payments` - Course checkout, confirmation, enrollment and webhook endpoints
//! - `middleware` - Bearer token authentication
//! - `error` - JSON error bodies

pub mod error;
pub mod middleware;
pub mod payments;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

pub use error::{panic_response, ApiError, ErrorResponse};
pub use middleware::AuthState;
pub use payments::{payments_router, PaymentsAppState};

/// GET /health - Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the application router with every API route mounted.
///
/// Cross-cutting layers (tracing, timeouts, CORS) are applied by the caller.
pub fn build_router(state: PaymentsAppState, auth: AuthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", payments_router(auth))
        .with_state(state)
}
