//! CORS middleware.
//!
//! Builds a tower-http CORS layer from [`CorsConfig`].

use crate::domain::config::CorsConfig;
use axum::http::{HeaderName, HeaderValue, Method};
use std::str::FromStr;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == "*")
}

/// Parse every entry, skipping the ones that are not valid header syntax.
fn parse_all<T: FromStr>(values: &[String]) -> Vec<T> {
    values.iter().filter_map(|v| v.parse().ok()).collect()
}

/// CORS layer for the gateway. Disabled config yields a layer that adds
/// no headers, so browsers fall back to same-origin.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }

    let origin: AllowOrigin = if is_wildcard(&config.allowed_origins) {
        Any.into()
    } else {
        parse_all::<HeaderValue>(&config.allowed_origins).into()
    };

    let headers: AllowHeaders = if is_wildcard(&config.allowed_headers) {
        Any.into()
    } else {
        parse_all::<HeaderName>(&config.allowed_headers).into()
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(parse_all::<Method>(&config.allowed_methods))
        .allow_headers(headers)
        .max_age(Duration::from_secs(config.max_age))
}
