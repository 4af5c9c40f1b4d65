use aria_core::HttpError;
use axum::response::IntoResponse;
use http::StatusCode;

pub type Result<T, E = TtsError> = std::result::Result<T, E>;

/// Errors surfaced by the synthesis core
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// The embedded signing-key constant failed to decode. Fatal; cannot
    /// be repaired at runtime.
    #[error("invalid signing key constant: {0}")]
    Config(String),

    /// Transport failure reaching either upstream endpoint
    #[error("upstream connection failed: {0}")]
    Connection(String),

    /// The credential-issuing endpoint rejected the signed request
    #[error("credential endpoint returned {status}: {message}")]
    CredentialDenied { status: u16, message: String },

    /// The credential response could not be parsed or its token carried
    /// no usable expiry claim
    #[error("credential response malformed: {0}")]
    CredentialMalformed(String),

    /// The synthesis endpoint returned a non-2xx; status and body are
    /// passed through to the API consumer unchanged
    #[error("synthesis backend returned {status}: {message}")]
    UpstreamSynthesis { status: u16, message: String },

    /// The voice catalog endpoint failed
    #[error("voice list fetch failed: {0}")]
    VoiceList(String),

    /// Request text exceeds the configured bound
    #[error("input text exceeds {limit} bytes")]
    TextTooLong { limit: usize },

    /// Unexpected failure reading an upstream response body
    #[error("internal error")]
    Internal(Option<String>),
}

impl HttpError for TtsError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Connection(_) | Self::CredentialDenied { .. } | Self::CredentialMalformed(_) | Self::VoiceList(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::UpstreamSynthesis { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::TextTooLong { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Config(_) => "configuration_error",
            Self::Connection(_) => "connection_error",
            Self::CredentialDenied { .. } | Self::CredentialMalformed(_) => "upstream_auth_error",
            Self::UpstreamSynthesis { .. } => "upstream_synthesis_error",
            Self::VoiceList(_) => "voice_list_error",
            Self::TextTooLong { .. } => "invalid_request_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for TtsError {
    fn into_response(self) -> axum::response::Response {
        // Synthesis failures are a verbatim passthrough of the upstream
        // status and body; everything else gets a JSON error object.
        if let Self::UpstreamSynthesis { status, message } = self {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            return (status, message).into_response();
        }

        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "type": self.error_type(),
                "message": self.client_message(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
