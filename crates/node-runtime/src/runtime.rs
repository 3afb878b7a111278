//! Service wiring.
//!
//! ```text
//! InMemoryGroupStore ──► GroupRepository ──┐
//!                                          ├──► ApiGatewayService
//! TokenManager ────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use gp_01_group_repository::{GroupRepository, GroupRepositoryApi, InMemoryGroupStore};
use gp_02_capability_tokens::{TokenManager, TokenService};
use gp_03_api_gateway::{ApiGatewayService, GatewayConfig};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// The assembled groupie node.
pub struct NodeRuntime {
    gateway: ApiGatewayService,
}

impl NodeRuntime {
    /// Wire every component from `config`.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let store = Arc::new(InMemoryGroupStore::new());
        let repository: Arc<dyn GroupRepositoryApi> = Arc::new(GroupRepository::new(store));
        let tokens: Arc<dyn TokenService> = Arc::new(build_token_manager(&config)?);

        let gateway = ApiGatewayService::new(config, repository, tokens)
            .context("failed to initialize API gateway")?;

        Ok(Self { gateway })
    }

    pub fn gateway(&self) -> &ApiGatewayService {
        &self.gateway
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.gateway.config().http_addr(), "Starting groupie node");
        self.gateway
            .run(shutdown)
            .await
            .context("API gateway terminated with an error")?;
        info!("Groupie node stopped");
        Ok(())
    }
}

fn build_token_manager(config: &GatewayConfig) -> Result<TokenManager> {
    match &config.token.secret {
        Some(secret) => TokenManager::new(secret.as_bytes()).context("invalid token secret"),
        None => {
            warn!("No token secret configured, generating a random signing key");
            Ok(TokenManager::random())
        }
    }
}
