#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod http_client;
mod request;
mod session;
mod signature;
mod ssml;
mod synthesizer;
mod types;
mod voices;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

pub use error::{Result, TtsError};
pub use session::{Credential, SessionManager};
pub use synthesizer::Synthesizer;
pub use types::{SpeechRequest, SpeechResponse, SynthesisDefaults, SynthesisRequest, TtsParams};
use request::ExtractJson;
use voices::VoiceCatalog;

/// User agent presented to both upstream endpoints, matching the mobile
/// client whose signing scheme this reproduces
pub(crate) const USER_AGENT: &str = "okhttp/4.5.0";

/// Display name used by the legacy reading-app config endpoints
const DEFAULT_DISPLAY_NAME: &str = "Microsoft TTS";

/// TTS server state shared by the route handlers
pub struct Server {
    synthesizer: Synthesizer,
    voices: VoiceCatalog,
    defaults: SynthesisDefaults,
}

/// Build the TTS server state from configuration
pub fn build_server(config: &aria_config::Config) -> Arc<Server> {
    Arc::new(Server {
        synthesizer: Synthesizer::new(&config.tts),
        voices: VoiceCatalog::new(config.tts.voice_list_url.as_ref().map(|u| u.as_str().to_string())),
        defaults: SynthesisDefaults {
            voice: config.tts.default_voice.clone(),
            style: config.tts.default_style.clone(),
            output_format: config.tts.default_format.clone(),
        },
    })
}

/// Create the endpoint router for TTS
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/tts", get(synthesize_query))
        .route("/v1/audio/speech", post(synthesize_openai))
        .route("/audio/speech", post(synthesize_openai))
        .route("/voices", get(list_voices))
        .route("/reader.json", get(reader_config))
        .route("/ifreetime.json", get(ifreetime_config))
}

/// Handle plain query-parameter synthesis requests
async fn synthesize_query(
    State(server): State<Arc<Server>>,
    Query(params): Query<TtsParams>,
) -> Result<axum::response::Response> {
    let request = params.into_synthesis(&server.defaults);
    tracing::debug!(voice = %request.voice, "tts handler called");

    let response = server.synthesizer.synthesize(request).await?;

    Ok(response.into_response())
}

/// Handle `OpenAI`-compatible synthesis requests
async fn synthesize_openai(
    State(server): State<Arc<Server>>,
    ExtractJson(request): ExtractJson<SpeechRequest>,
) -> Result<axum::response::Response> {
    tracing::debug!(model = %request.model, "speech handler called");

    let response = server
        .synthesizer
        .synthesize(request.into_synthesis(&server.defaults))
        .await?;

    Ok(response.into_response())
}

#[derive(Debug, Deserialize)]
struct VoicesParams {
    /// Locale substring filter
    #[serde(default, rename = "l")]
    locale: Option<String>,
}

/// Handle voice catalog requests
async fn list_voices(
    State(server): State<Arc<Server>>,
    Query(params): Query<VoicesParams>,
) -> Result<Json<Vec<Value>>> {
    let voices = server.voices.list(params.locale.as_deref()).await?;
    Ok(Json(voices))
}

/// Parameters shared by the legacy reading-app config endpoints
#[derive(Debug, Deserialize)]
struct LegacyAppParams {
    #[serde(rename = "v")]
    voice: Option<String>,
    #[serde(rename = "r")]
    rate: Option<String>,
    #[serde(rename = "p")]
    pitch: Option<String>,
    #[serde(rename = "s")]
    style: Option<String>,
    #[serde(rename = "n")]
    name: Option<String>,
    api_key: Option<String>,
}

/// Reading-app config: `/tts` with the caller's parameters baked into a
/// URL template the app fills at speak time
async fn reader_config(headers: http::HeaderMap, Query(params): Query<LegacyAppParams>) -> Json<Value> {
    let mut query = vec![
        "t={{java.encodeURI(speakText)}}".to_string(),
        "r={{speakSpeed*4}}".to_string(),
    ];

    if let Some(voice) = params.voice.filter(|v| !v.is_empty()) {
        query.push(format!("v={voice}"));
    }
    if let Some(pitch) = params.pitch.filter(|p| !p.is_empty()) {
        query.push(format!("p={pitch}"));
    }
    if let Some(style) = params.style.filter(|s| !s.is_empty()) {
        query.push(format!("s={style}"));
    }
    if let Some(api_key) = params.api_key.filter(|k| !k.is_empty()) {
        query.push(format!("api_key={api_key}"));
    }

    let url = format!("{}/tts?{}", base_url(&headers), query.join("&"));

    Json(json!({
        "id": jiff::Timestamp::now().as_millisecond(),
        "name": params.name.unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
        "url": url,
    }))
}

/// IFreeTime app config blob referencing `/tts`
async fn ifreetime_config(headers: http::HeaderMap, Query(params): Query<LegacyAppParams>) -> Json<Value> {
    let mut request_params = serde_json::Map::new();
    // "%@" is the app's text placeholder
    request_params.insert("t".to_string(), json!("%@"));
    request_params.insert("v".to_string(), json!(params.voice.unwrap_or_default()));
    request_params.insert("r".to_string(), json!(params.rate.unwrap_or_default()));
    request_params.insert("p".to_string(), json!(params.pitch.unwrap_or_default()));
    request_params.insert("s".to_string(), json!(params.style.unwrap_or_default()));
    if let Some(api_key) = params.api_key.filter(|k| !k.is_empty()) {
        request_params.insert("api_key".to_string(), json!(api_key));
    }

    let http_configs = json!({ "useCookies": 1, "headers": {} });

    Json(json!({
        "loginUrl": "",
        "maxWordCount": "",
        "customRules": {},
        "ttsConfigGroup": "Azure",
        "_TTSName": params.name.unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
        "_ClassName": "JxdAdvCustomTTS",
        "_TTSConfigID": uuid::Uuid::new_v4().to_string(),
        "httpConfigs": http_configs.clone(),
        "voiceList": [],
        "ttsHandles": [{
            "paramsEx": "",
            "processType": 1,
            "maxPageCount": 1,
            "nextPageMethod": 1,
            "method": 1,
            "requestByWebView": 0,
            "parser": {},
            "nextPageParams": {},
            "url": format!("{}/tts", base_url(&headers)),
            "params": request_params,
            "httpConfigs": http_configs,
        }]
    }))
}

/// The deployment sits behind TLS termination, so generated URLs are
/// always https
fn base_url(headers: &http::HeaderMap) -> String {
    let host = headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("https://{host}")
}
