use crate::domain::config::GatewayConfig;
use crate::middleware::{create_cors_layer, AuthLayer, TracingLayer};
use crate::rest::{handlers, AppState};
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

/// Build the HTTP router with the full middleware stack.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TracingLayer::new())
        .layer(create_cors_layer(&config.cors))
        .layer(TimeoutLayer::new(config.http.request_timeout))
        .layer(AuthLayer::new(Arc::clone(&state.tokens)));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/group", post(handlers::create_group))
        .route(
            "/group/:id",
            post(handlers::join_group).get(handlers::get_group),
        )
        .route("/group/:id/ws", get(handlers::ws_upgrade))
        .route("/member/:id", delete(handlers::kick_member))
        .route("/member/:id/role", patch(handlers::update_role))
        .route("/member/:id/coords-bit", patch(handlers::update_coords_bit))
        .layer(middleware)
        .with_state(state)
}
