//! # Node Runtime Library
//!
//! Configuration loading and service wiring for the groupie server.
//! The main entry point is the `main.rs` binary.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod runtime;

pub use config::{load_config, load_config_from, EnvConfigError};
pub use runtime::NodeRuntime;
