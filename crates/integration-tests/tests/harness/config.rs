//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use aria_config::{AuthConfig, Config, HealthConfig, ServerConfig, TtsConfig};
use secrecy::SecretString;

use super::mock_backend::MockSpeechBackend;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                    cors: None,
                },
                tts: TtsConfig::default(),
                auth: None,
                telemetry: None,
            },
        }
    }

    /// Point every upstream URL at the mock backend
    pub fn with_backend(mut self, backend: &MockSpeechBackend) -> Self {
        self.config.tts.credential_url = Some(backend.credential_url().parse().expect("valid URL"));
        self.config.tts.synthesis_host = Some(backend.base_url().parse().expect("valid URL"));
        self.config.tts.voice_list_url = Some(backend.voice_list_url().parse().expect("valid URL"));
        self
    }

    /// Enable the API key gate with the given key
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.config.auth = Some(AuthConfig {
            enabled: true,
            api_key: SecretString::from(key),
            public_paths: vec!["/health".to_string(), "/voices".to_string()],
        });
        self
    }

    /// Cap the accepted text size
    pub fn with_max_text_bytes(mut self, limit: usize) -> Self {
        self.config.tts.max_text_bytes = limit;
        self
    }

    /// Disable the health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
