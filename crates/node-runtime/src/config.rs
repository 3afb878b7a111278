//! # Node Configuration
//!
//! Starts from [`GatewayConfig::default`] and applies `GROUPIE_*`
//! environment overrides.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GROUPIE_HOST` | `0.0.0.0` |
//! | `GROUPIE_PORT` | `8080` |
//! | `GROUPIE_TOKEN_SECRET` | random per process |
//! | `GROUPIE_REQUEST_TIMEOUT_SECS` | `15` |

use gp_03_api_gateway::GatewayConfig;
use std::time::Duration;

pub const ENV_HOST: &str = "GROUPIE_HOST";
pub const ENV_PORT: &str = "GROUPIE_PORT";
pub const ENV_TOKEN_SECRET: &str = "GROUPIE_TOKEN_SECRET";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "GROUPIE_REQUEST_TIMEOUT_SECS";

/// An environment override that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {variable}: {value:?}")]
pub struct EnvConfigError {
    pub variable: &'static str,
    pub value: String,
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<GatewayConfig, EnvConfigError> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration using `lookup` in place of the process environment.
pub fn load_config_from<F>(lookup: F) -> Result<GatewayConfig, EnvConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GatewayConfig::default();

    if let Some(host) = lookup(ENV_HOST) {
        config.http.host = parse(ENV_HOST, host)?;
    }

    if let Some(port) = lookup(ENV_PORT) {
        config.http.port = parse(ENV_PORT, port)?;
    }

    if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
        config.http.request_timeout = Duration::from_secs(parse(ENV_REQUEST_TIMEOUT_SECS, secs)?);
    }

    if let Some(secret) = lookup(ENV_TOKEN_SECRET) {
        config.token.secret = Some(secret);
    }

    Ok(config)
}

fn parse<T: std::str::FromStr>(variable: &'static str, value: String) -> Result<T, EnvConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| EnvConfigError { variable, value })
}
