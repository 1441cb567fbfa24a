use crate::{
    AppState,
    auth::{PermissionGate, TokenVerifier, require_permission},
    handlers,
};
use axum::{
    Router, middleware,
    routing::{MethodRouter, delete, get, patch, post},
};
use std::sync::Arc;

pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
pub const POST_DRINKS: &str = "post:drinks";
pub const PATCH_DRINKS: &str = "patch:drinks";
pub const DELETE_DRINKS: &str = "delete:drinks";

/// Wraps one method router in the permission gate. The gate is scoped to the methods of
/// `route` only, so a path can mix public and protected methods.
fn gated(
    verifier: &Arc<TokenVerifier>,
    permission: &'static str,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    let gate = PermissionGate {
        permission,
        verifier: verifier.clone(),
    };
    route.route_layer(middleware::from_fn_with_state(gate, require_permission))
}

/// Protected Router Module
///
/// Route table for the write and detail endpoints. Permissions are independent of each
/// other: holding `post:drinks` grants nothing on `PATCH` or `DELETE`.
pub fn protected_routes(verifier: &Arc<TokenVerifier>) -> Router<AppState> {
    Router::new()
        // GET /drinks-detail
        // Every drink in the long view.
        .route(
            "/drinks-detail",
            gated(verifier, GET_DRINKS_DETAIL, get(handlers::get_drinks_detail)),
        )
        // POST /drinks
        // Merged with the public GET on the same path.
        .route(
            "/drinks",
            gated(verifier, POST_DRINKS, post(handlers::create_drink)),
        )
        // PATCH/DELETE /drinks/{id}
        // Each method carries its own permission.
        .route(
            "/drinks/{id}",
            gated(verifier, PATCH_DRINKS, patch(handlers::patch_drink)).merge(gated(
                verifier,
                DELETE_DRINKS,
                delete(handlers::delete_drink),
            )),
        )
}
