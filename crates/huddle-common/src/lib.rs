//! # huddle-common
//!
//! Shared utilities for the DevHuddle client crates: configuration and telemetry.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{AppSettings, ClientConfig, ConfigError, Environment, GatewayConfig};
pub use telemetry::{
    init_tracing, try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError,
};
