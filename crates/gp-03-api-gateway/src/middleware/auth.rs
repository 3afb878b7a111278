//! Token extraction middleware.
//!
//! Reads a capability token from `Authorization: Bearer <token>` or the
//! `token` query parameter and verifies it. A verified token attaches an
//! [`Identity`] to the request; an invalid one is answered with 401 before
//! any handler runs; no token at all passes through anonymously and is
//! rejected later by handlers that require a [`Caller`].

use crate::domain::error::ApiError;
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, Request},
    response::{IntoResponse, Response},
};
use gp_02_capability_tokens::TokenService;
use serde::Deserialize;
use shared_types::SecurityPile;
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Verified credentials of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub SecurityPile);

/// Authentication layer
#[derive(Clone)]
pub struct AuthLayer {
    tokens: Arc<dyn TokenService>,
}

impl AuthLayer {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            tokens: Arc::clone(&self.tokens),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    tokens: Arc<dyn TokenService>,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let tokens = Arc::clone(&self.tokens);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if let Some(token) = extract_token(&req) {
                match tokens.verify(&token) {
                    Ok(pile) => {
                        req.extensions_mut().insert(Identity(pile));
                    }
                    Err(e) => {
                        warn!(
                            path = %req.uri().path(),
                            error = %e,
                            "Rejected request with invalid token"
                        );
                        return Ok(ApiError::unauthorized("invalid token").into_response());
                    }
                }
            } else {
                debug!(path = %req.uri().path(), "Anonymous request");
            }

            inner.call(req).await
        })
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Token from the Authorization header, falling back to the query string.
fn extract_token<B>(req: &Request<B>) -> Option<String> {
    if let Some(auth) = req.headers().get(AUTHORIZATION) {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(query)| query.token)
}

/// Extractor for handlers that require an authenticated caller.
#[derive(Debug, Clone)]
pub struct Caller(pub SecurityPile);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .map(|identity| Caller(identity.0.clone()))
            .ok_or_else(|| ApiError::unauthorized("missing token"))
    }
}
