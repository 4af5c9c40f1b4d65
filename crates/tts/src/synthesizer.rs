use reqwest::Client;

use crate::USER_AGENT;
use crate::error::{Result, TtsError};
use crate::http_client::http_client;
use crate::session::SessionManager;
use crate::ssml;
use crate::types::{SpeechResponse, SynthesisRequest};

/// Issues authenticated synthesis requests against the regional endpoint
///
/// Within one call the order is fixed: credential check, then SSML build,
/// then the synthesis POST — the token must exist before it can be sent.
pub struct Synthesizer {
    client: Client,
    session: SessionManager,
    synthesis_host: Option<String>,
    max_text_bytes: usize,
}

impl Synthesizer {
    pub fn new(config: &aria_config::TtsConfig) -> Self {
        Self {
            client: http_client(),
            session: SessionManager::new(config.credential_url.as_ref().map(|u| u.as_str().to_string())),
            synthesis_host: config
                .synthesis_host
                .as_ref()
                .map(|u| u.as_str().trim_end_matches('/').to_string()),
            max_text_bytes: config.max_text_bytes,
        }
    }

    /// Synthesize one request, renewing the session credential if needed
    ///
    /// Upstream failures propagate unchanged; there is no retry here.
    pub async fn synthesize(&self, request: SynthesisRequest) -> Result<SpeechResponse> {
        if request.text.len() > self.max_text_bytes {
            return Err(TtsError::TextTooLong {
                limit: self.max_text_bytes,
            });
        }

        let credential = self.session.ensure().await?;
        let url = self.endpoint_for(&credential.region);
        let ssml = ssml::build(
            &request.text,
            &request.voice,
            request.rate,
            request.pitch,
            &request.style,
        );

        tracing::debug!(
            voice = %request.voice,
            format = %request.output_format,
            text_len = request.text.len(),
            "synthesis request"
        );

        let response = self
            .client
            .post(&url)
            .header(http::header::AUTHORIZATION, &credential.token)
            .header(http::header::CONTENT_TYPE, "application/ssml+xml")
            .header(http::header::USER_AGENT, USER_AGENT)
            .header("X-Microsoft-OutputFormat", &request.output_format)
            .body(ssml)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("synthesis request failed: {e}");
                TtsError::Connection(format!("failed to reach synthesis endpoint: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.text().await {
                Ok(body) if !body.is_empty() => body,
                _ => status.canonical_reason().unwrap_or("upstream error").to_string(),
            };
            tracing::error!("synthesis endpoint error ({status}): {message}");
            return Err(TtsError::UpstreamSynthesis {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let audio = response.bytes().await.map_err(|e| {
            tracing::error!("failed to read synthesis response body: {e}");
            TtsError::Internal(Some(e.to_string()))
        })?;

        tracing::debug!("synthesis complete, {} bytes", audio.len());

        // The filename extension stays ".mp3" for every output format, the
        // way deployed clients expect it.
        let disposition = request
            .download
            .then(|| format!("attachment; filename=\"{}.mp3\"", uuid::Uuid::new_v4().simple()));

        Ok(SpeechResponse {
            audio: audio.to_vec(),
            content_type,
            disposition,
        })
    }

    fn endpoint_for(&self, region: &str) -> String {
        self.synthesis_host.as_ref().map_or_else(
            || format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1"),
            |base| format!("{base}/cognitiveservices/v1"),
        )
    }
}
