use secrecy::SecretString;
use serde::Deserialize;

/// API key gate configuration
///
/// One shared secret gates the synthesis endpoints. Clients present it
/// either as a Bearer token or as the `api_key` query parameter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Whether the API key gate is enabled
    #[serde(default)]
    pub enabled: bool,

    /// The shared API key
    pub api_key: SecretString,

    /// Paths that skip authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/voices".to_string()]
}
