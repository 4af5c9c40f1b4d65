#![allow(clippy::must_use_candidate)]

pub mod auth;
pub mod cors;
mod env;
pub mod health;
mod loader;
pub mod server;
pub mod telemetry;
pub mod tts;

use serde::Deserialize;

pub use auth::*;
pub use cors::*;
pub use health::*;
pub use server::*;
pub use telemetry::*;
pub use tts::*;

/// Top-level aria configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Speech synthesis upstream configuration
    #[serde(default)]
    pub tts: TtsConfig,
    /// API key gate configuration
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
