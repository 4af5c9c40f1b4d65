use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use reqwest::Client;
use tokio::sync::Mutex;

use crate::USER_AGENT;
use crate::error::{Result, TtsError};
use crate::http_client::http_client;
use crate::signature;

/// Fixed credential-issuing endpoint
const CREDENTIAL_URL: &str = "https://dev.microsofttranslator.com/apps/endpoint?api-version=1.0";

/// Client version advertised to the credential endpoint
const CLIENT_VERSION: &str = "4.0.530a 5fe1dc6c";

/// Credentials are renewed this many seconds before their actual expiry
const RENEWAL_MARGIN_SECS: i64 = 60;

/// A live synthesis credential: bearer token plus the region that serves it
///
/// Replaced wholesale on renewal, never partially mutated.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Opaque bearer token, attached to synthesis requests verbatim
    pub token: String,
    /// Region code naming the synthesis endpoint host
    pub region: String,
    /// Expiry in epoch seconds, read from the token's claims segment
    pub expires_at: i64,
}

impl Credential {
    /// Whether the credential must be renewed as of `now` (epoch seconds)
    pub fn needs_renewal(&self, now: i64) -> bool {
        now >= self.expires_at - RENEWAL_MARGIN_SECS
    }
}

#[derive(serde::Deserialize)]
struct IssueResponse {
    /// Bearer token; dot-delimited, middle segment carries the claims
    t: String,
    /// Region code
    r: String,
}

#[derive(serde::Deserialize)]
struct TokenClaims {
    exp: i64,
}

/// Owns the process-wide credential and its renewal protocol
///
/// The slot mutex is held across the issuing round trip, so concurrent
/// callers racing on an expired credential queue behind the first one and
/// reuse the credential it obtains: exactly one upstream call per renewal.
pub struct SessionManager {
    client: Client,
    credential_url: String,
    current: Mutex<Option<Credential>>,
}

impl SessionManager {
    pub fn new(credential_url: Option<String>) -> Self {
        Self {
            client: http_client(),
            credential_url: credential_url.unwrap_or_else(|| CREDENTIAL_URL.to_string()),
            current: Mutex::new(None),
        }
    }

    /// Return a valid credential, renewing when absent or within the
    /// renewal margin of expiry
    pub async fn ensure(&self) -> Result<Credential> {
        let mut slot = self.current.lock().await;
        let now = jiff::Timestamp::now().as_second();

        if let Some(credential) = slot.as_ref() {
            if credential.needs_renewal(now) {
                tracing::debug!(
                    expires_at = credential.expires_at,
                    "credential expired or near expiry, renewing"
                );
            } else {
                return Ok(credential.clone());
            }
        }

        let credential = self.issue().await?;
        tracing::info!(
            region = %credential.region,
            expires_in_secs = credential.expires_at - now,
            "issued new session credential"
        );
        *slot = Some(credential.clone());
        Ok(credential)
    }

    /// One signed round trip to the credential endpoint
    async fn issue(&self) -> Result<Credential> {
        let signature = signature::sign(&self.credential_url)?;
        let user_id = random_user_id();
        let trace_id = signature::new_trace_id();

        let response = self
            .client
            .post(&self.credential_url)
            .header("Accept-Language", "zh-Hans")
            .header("X-ClientVersion", CLIENT_VERSION)
            .header("X-UserId", &user_id)
            .header("X-HomeGeographicRegion", "zh-Hans-CN")
            .header("X-ClientTraceId", &trace_id)
            .header("X-MT-Signature", signature)
            .header(http::header::USER_AGENT, USER_AGENT)
            .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
            .header(http::header::CONTENT_LENGTH, "0")
            .header("Accept-Encoding", "gzip")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("credential request failed: {e}");
                TtsError::Connection(format!("failed to reach credential endpoint: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            tracing::error!("credential endpoint error ({status}): {message}");
            return Err(TtsError::CredentialDenied {
                status: status.as_u16(),
                message,
            });
        }

        let issued: IssueResponse = response
            .json()
            .await
            .map_err(|e| TtsError::CredentialMalformed(format!("unexpected response body: {e}")))?;

        let expires_at = decode_expiry(&issued.t)?;

        Ok(Credential {
            token: issued.t,
            region: issued.r,
            expires_at,
        })
    }
}

/// Read the expiry claim from the token's middle segment
///
/// Decode-only: the token was just issued over a trusted channel, so no
/// signature verification happens here. Do not reuse this for tokens from
/// untrusted sources.
fn decode_expiry(token: &str) -> Result<i64> {
    let claims_segment = token
        .split('.')
        .nth(1)
        .ok_or_else(|| TtsError::CredentialMalformed("token has no claims segment".to_string()))?;

    let decoded = URL_SAFE_NO_PAD
        .decode(claims_segment)
        .map_err(|e| TtsError::CredentialMalformed(format!("claims segment is not base64: {e}")))?;

    let claims: TokenClaims = serde_json::from_slice(&decoded)
        .map_err(|e| TtsError::CredentialMalformed(format!("claims segment is not claims JSON: {e}")))?;

    Ok(claims.exp)
}

/// 16 lowercase hex characters, mimicking the mobile client's user id
fn random_user_id() -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut rng = rand::rng();
    (0..16).map(|_| HEX[rng.random_range(0..16)] as char).collect()
}
