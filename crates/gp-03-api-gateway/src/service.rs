//! API Gateway service - main entry point.
//!
//! Owns the connection hub and serves the REST and WebSocket endpoints on
//! one HTTP listener.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::rest::AppState;
use crate::router::build_router;
use crate::ws::Hub;
use axum::Router;
use gp_01_group_repository::GroupRepositoryApi;
use gp_02_capability_tokens::TokenService;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// API Gateway service state
pub struct ApiGatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl ApiGatewayService {
    /// Create a new API Gateway service
    pub fn new(
        config: GatewayConfig,
        repository: Arc<dyn GroupRepositoryApi>,
        tokens: Arc<dyn TokenService>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        for warning in config.validate_for_production() {
            warn!(warning = %warning, "Gateway configuration warning");
        }

        let hub = Arc::new(Hub::new(Arc::clone(&repository)));
        let state = AppState {
            repository,
            tokens,
            hub,
            websocket: config.websocket.clone(),
        };

        Ok(Self { config, state })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn hub(&self) -> Arc<Hub> {
        Arc::clone(&self.state.hub)
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.config.http_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))
    }

    /// Serve until `shutdown` resolves, then close every live connection.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        info!(addr = %addr, "Starting HTTP server");

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()));

        self.state.hub.close_all().await;
        info!("API Gateway stopped");
        result
    }

    /// Bind and serve.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }
}
