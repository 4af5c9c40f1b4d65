use serde::Deserialize;

/// Logging configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Log filter directive (e.g. "info" or "tts=debug,info")
    #[serde(default)]
    pub filter: Option<String>,
    /// Log output format
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Full,
    /// Newline-delimited JSON
    Json,
}
