use serde::Deserialize;
use url::Url;

/// Speech synthesis upstream configuration
///
/// The three URL overrides exist for tests and unusual deployments; when
/// absent, the fixed production endpoints are used.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TtsConfig {
    /// Override for the credential-issuing endpoint
    #[serde(default)]
    pub credential_url: Option<Url>,
    /// Override for the synthesis endpoint base (replaces the
    /// region-derived `https://{region}.tts.speech.microsoft.com` host)
    #[serde(default)]
    pub synthesis_host: Option<Url>,
    /// Override for the voice catalog endpoint
    #[serde(default)]
    pub voice_list_url: Option<Url>,
    /// Voice used when a request names none
    #[serde(default = "default_voice")]
    pub default_voice: String,
    /// Expressive style used when a request names none
    #[serde(default = "default_style")]
    pub default_style: String,
    /// Output format used when a request names none
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Requests with more text than this are rejected with 400 before
    /// any upstream call
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            credential_url: None,
            synthesis_host: None,
            voice_list_url: None,
            default_voice: default_voice(),
            default_style: default_style(),
            default_format: default_format(),
            max_text_bytes: default_max_text_bytes(),
        }
    }
}

fn default_voice() -> String {
    "zh-CN-XiaoxiaoMultilingualNeural".to_string()
}

fn default_style() -> String {
    "general".to_string()
}

fn default_format() -> String {
    "audio-24khz-48kbitrate-mono-mp3".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_text_bytes() -> usize {
    64 * 1024
}
