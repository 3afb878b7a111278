//! REST boundary: shared handler state and the endpoint handlers.

pub mod handlers;

use crate::domain::config::WebSocketConfig;
use crate::ws::Hub;
use gp_01_group_repository::GroupRepositoryApi;
use gp_02_capability_tokens::TokenService;
use std::sync::Arc;

pub use handlers::{CreatedResponse, JoinResponse, MemberRequest};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn GroupRepositoryApi>,
    pub tokens: Arc<dyn TokenService>,
    pub hub: Arc<Hub>,
    pub websocket: WebSocketConfig,
}
