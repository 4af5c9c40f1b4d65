use serde::Deserialize;

/// One synthesis call against the upstream backend
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Text to synthesize; may carry whitelisted SSML fragments
    pub text: String,
    /// Upstream voice name
    pub voice: String,
    /// Rate delta in percent (-100..100)
    pub rate: i32,
    /// Pitch delta in percent (-100..100)
    pub pitch: i32,
    /// Expressive style name
    pub style: String,
    /// Upstream output-format identifier, passed through verbatim
    pub output_format: String,
    /// Whether the response should carry download semantics
    pub download: bool,
}

/// Raw audio response from the synthesis backend
pub struct SpeechResponse {
    /// Raw audio bytes
    pub audio: Vec<u8>,
    /// Content type of the audio (e.g. "audio/mpeg")
    pub content_type: String,
    /// Attachment disposition when download semantics were requested
    pub disposition: Option<String>,
}

impl SpeechResponse {
    /// Convert the speech response into an axum HTTP response
    pub fn into_response(self) -> axum::response::Response {
        let mut builder = axum::response::Response::builder().header(http::header::CONTENT_TYPE, self.content_type);

        if let Some(disposition) = self.disposition {
            builder = builder.header(http::header::CONTENT_DISPOSITION, disposition);
        }

        builder.body(axum::body::Body::from(self.audio)).unwrap_or_else(|_| {
            axum::response::Response::builder()
                .status(http::StatusCode::INTERNAL_SERVER_ERROR)
                .body(axum::body::Body::empty())
                .unwrap()
        })
    }
}

/// Request defaults taken from configuration
#[derive(Debug, Clone)]
pub struct SynthesisDefaults {
    pub voice: String,
    pub style: String,
    pub output_format: String,
}

/// Query parameters accepted by the plain `/tts` endpoint
#[derive(Debug, Deserialize)]
pub struct TtsParams {
    /// Text to synthesize
    #[serde(default, rename = "t")]
    pub text: String,
    /// Voice name
    #[serde(rename = "v")]
    pub voice: Option<String>,
    /// Rate delta (-100..100)
    #[serde(rename = "r")]
    pub rate: Option<i32>,
    /// Pitch delta (-100..100)
    #[serde(rename = "p")]
    pub pitch: Option<i32>,
    /// Expressive style
    #[serde(rename = "s")]
    pub style: Option<String>,
    /// Output format identifier
    #[serde(rename = "o")]
    pub output_format: Option<String>,
    /// Serve the audio as a file download
    #[serde(rename = "d")]
    pub download: Option<bool>,
}

impl TtsParams {
    pub fn into_synthesis(self, defaults: &SynthesisDefaults) -> SynthesisRequest {
        SynthesisRequest {
            text: self.text,
            voice: self.voice.unwrap_or_else(|| defaults.voice.clone()),
            rate: self.rate.unwrap_or(0),
            pitch: self.pitch.unwrap_or(0),
            style: self.style.unwrap_or_else(|| defaults.style.clone()),
            output_format: self.output_format.unwrap_or_else(|| defaults.output_format.clone()),
            download: self.download.unwrap_or(false),
        }
    }
}

/// Speech synthesis request following the `OpenAI` TTS API format
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    /// Model identifier; forwarded to the backend as the expressive style
    pub model: String,
    /// Text to synthesize into speech
    pub input: String,
    /// `OpenAI` voice alias or an upstream voice name
    pub voice: Option<String>,
    /// Output audio format ("opus" selects the Opus profile, anything
    /// else the MP3 profile)
    pub response_format: Option<String>,
    /// Speech speed multiplier (0.25 to 4.0)
    pub speed: Option<f64>,
}

/// `OpenAI` voice aliases mapped onto upstream voice names; unknown values
/// pass through unchanged
const VOICE_ALIASES: &[(&str, &str)] = &[
    ("alloy", "zh-CN-XiaoxiaoMultilingualNeural"),
    ("echo", "zh-CN-YunxiNeural"),
    ("fable", "zh-CN-XiaomoNeural"),
    ("onyx", "zh-CN-YunjianNeural"),
    ("nova", "zh-CN-XiaochenNeural"),
    ("shimmer", "en-US-AriaNeural"),
];

const OPUS_FORMAT: &str = "audio-48khz-192kbitrate-mono-opus";
const MP3_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

impl SpeechRequest {
    pub fn into_synthesis(self, defaults: &SynthesisDefaults) -> SynthesisRequest {
        let voice = self.voice.map_or_else(
            || defaults.voice.clone(),
            |voice| {
                VOICE_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == voice)
                    .map_or(voice, |(_, name)| (*name).to_string())
            },
        );

        let output_format = if self.response_format.as_deref() == Some("opus") {
            OPUS_FORMAT
        } else {
            MP3_FORMAT
        };

        SynthesisRequest {
            text: self.input,
            voice,
            rate: self.speed.map_or(0, speed_to_rate),
            pitch: 0,
            style: self.model,
            output_format: output_format.to_string(),
            download: false,
        }
    }
}

/// Map the 0.25–4.0 speed multiplier onto the backend's -100..100 rate
/// delta (1.0 is normal speed)
#[allow(clippy::cast_possible_truncation)]
fn speed_to_rate(speed: f64) -> i32 {
    ((speed - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32
}
