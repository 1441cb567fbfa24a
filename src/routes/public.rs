use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without an `Authorization` header. The drink listing only ever
/// exposes the short view.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /drinks
        // Every drink, ingredient names withheld.
        .route("/drinks", get(handlers::get_drinks))
}
