//! Mock speech backend for integration tests
//!
//! Stands in for both upstream services: the credential issuer and the
//! regional synthesis endpoint, plus the voice catalog. Counts calls so
//! tests can assert on renewal and caching behavior.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tokio_util::sync::CancellationToken;

/// Size of the canned audio payload
pub const AUDIO_PAYLOAD_LEN: usize = 200;

/// The canned audio bytes every successful synthesis call returns
#[allow(clippy::cast_possible_truncation)]
pub fn audio_payload() -> Vec<u8> {
    (0..AUDIO_PAYLOAD_LEN).map(|i| i as u8).collect()
}

/// A running mock backend instance
pub struct MockSpeechBackend {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    credential_count: AtomicU32,
    synthesis_count: AtomicU32,
    voices_count: AtomicU32,
    /// When set, the synthesis endpoint fails with this status and body
    synthesis_failure: Option<(u16, String)>,
    /// Delay before answering credential requests, to widen race windows
    credential_delay_ms: u64,
    /// Lifetime of issued tokens in seconds
    token_ttl_secs: i64,
    last_output_format: Mutex<Option<String>>,
    last_authorization: Mutex<Option<String>>,
    last_ssml: Mutex<Option<String>>,
}

impl MockSpeechBackend {
    /// Start a mock that succeeds on every call
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(None, 0, 600).await
    }

    /// Start a mock whose synthesis endpoint fails with `status`/`body`
    pub async fn start_failing_synthesis(status: u16, body: &str) -> anyhow::Result<Self> {
        Self::start_inner(Some((status, body.to_owned())), 0, 600).await
    }

    /// Start a mock that answers credential requests after a delay
    pub async fn start_with_slow_credentials(delay_ms: u64) -> anyhow::Result<Self> {
        Self::start_inner(None, delay_ms, 600).await
    }

    /// Start a mock issuing tokens with the given lifetime
    pub async fn start_with_token_ttl(ttl_secs: i64) -> anyhow::Result<Self> {
        Self::start_inner(None, 0, ttl_secs).await
    }

    async fn start_inner(
        synthesis_failure: Option<(u16, String)>,
        credential_delay_ms: u64,
        token_ttl_secs: i64,
    ) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            credential_count: AtomicU32::new(0),
            synthesis_count: AtomicU32::new(0),
            voices_count: AtomicU32::new(0),
            synthesis_failure,
            credential_delay_ms,
            token_ttl_secs,
            last_output_format: Mutex::new(None),
            last_authorization: Mutex::new(None),
            last_ssml: Mutex::new(None),
        });

        let app = Router::new()
            .route("/apps/endpoint", routing::post(handle_credential))
            .route("/cognitiveservices/v1", routing::post(handle_synthesis))
            .route("/cognitiveservices/voices/list", routing::get(handle_voices))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL of the mock (used as the synthesis host override)
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Credential-issuing URL override
    pub fn credential_url(&self) -> String {
        format!("http://{}/apps/endpoint?api-version=1.0", self.addr)
    }

    /// Voice catalog URL override
    pub fn voice_list_url(&self) -> String {
        format!("http://{}/cognitiveservices/voices/list", self.addr)
    }

    /// Number of credential-issuing calls received
    pub fn credential_count(&self) -> u32 {
        self.state.credential_count.load(Ordering::Relaxed)
    }

    /// Number of synthesis calls received
    pub fn synthesis_count(&self) -> u32 {
        self.state.synthesis_count.load(Ordering::Relaxed)
    }

    /// Number of voice list calls received
    pub fn voices_count(&self) -> u32 {
        self.state.voices_count.load(Ordering::Relaxed)
    }

    /// Output-format header of the last synthesis call
    pub fn last_output_format(&self) -> Option<String> {
        self.state.last_output_format.lock().unwrap().clone()
    }

    /// Authorization header of the last synthesis call
    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }

    /// SSML body of the last synthesis call
    pub fn last_ssml(&self) -> Option<String> {
        self.state.last_ssml.lock().unwrap().clone()
    }
}

impl Drop for MockSpeechBackend {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Fabricate a dot-delimited token whose claims segment carries an expiry
fn make_token(ttl_secs: i64) -> String {
    let exp = jiff::Timestamp::now().as_second() + ttl_secs;
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"region":"eastus"}}"#));
    format!("eyJhbGciOiJFUzI1NiJ9.{claims}.c2lnbmF0dXJl")
}

async fn handle_credential(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    state.credential_count.fetch_add(1, Ordering::Relaxed);

    if state.credential_delay_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(state.credential_delay_ms)).await;
    }

    Json(serde_json::json!({
        "t": make_token(state.token_ttl_secs),
        "r": "eastus",
    }))
}

async fn handle_synthesis(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> axum::response::Response {
    state.synthesis_count.fetch_add(1, Ordering::Relaxed);

    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    *state.last_output_format.lock().unwrap() = header_value("x-microsoft-outputformat");
    *state.last_authorization.lock().unwrap() = header_value("authorization");
    *state.last_ssml.lock().unwrap() = Some(body);

    if let Some((status, body)) = &state.synthesis_failure {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, body.clone()).into_response();
    }

    (
        [(axum::http::header::CONTENT_TYPE, "audio/mpeg")],
        audio_payload(),
    )
        .into_response()
}

async fn handle_voices(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    state.voices_count.fetch_add(1, Ordering::Relaxed);

    Json(serde_json::json!([
        {"ShortName": "zh-CN-XiaoxiaoNeural", "Locale": "zh-CN"},
        {"ShortName": "en-US-AriaNeural", "Locale": "en-US"},
        {"ShortName": "en-GB-SoniaNeural", "Locale": "en-GB"},
    ]))
}
