use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::Sha256;

use crate::error::{Result, TtsError};

type HmacSha256 = Hmac<Sha256>;

/// Client identifier the credential endpoint expects
const CLIENT_ID: &str = "MSTranslatorAndroidApp";

/// Embedded signing key, reproduced byte-for-byte from the mobile client.
/// A fixed protocol parameter, not an operator secret; it only changes if
/// the upstream protocol does.
const SIGNING_KEY_B64: &str = "oik6PdDdMnOXemTbwvMn9de/h9lFnfBaCWbGMMZqqoSaQaqUOqjVGm5NqsmjcBI1x+sS9ugjB55HEJWRiFXYFw==";

/// Byte set escaped the way JavaScript's encodeURIComponent does: every
/// non-alphanumeric except `- _ . ! ~ * ' ( )`
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Sign a credential-endpoint URL with a fresh date and trace id
///
/// Returns the `clientId::signature::date::traceId` header value.
pub fn sign(target_url: &str) -> Result<String> {
    sign_at(target_url, &http_date_now(), &new_trace_id())
}

/// Deterministic signing core: same (url, date, trace) → same output
fn sign_at(target_url: &str, formatted_date: &str, trace_id: &str) -> Result<String> {
    let key = BASE64
        .decode(SIGNING_KEY_B64)
        .map_err(|e| TtsError::Config(format!("signing key is not valid base64: {e}")))?;

    let url_part = target_url.split_once("://").map_or(target_url, |(_, rest)| rest);
    let encoded_url = utf8_percent_encode(url_part, URL_COMPONENT).to_string();

    let to_sign = format!("{CLIENT_ID}{encoded_url}{formatted_date}{trace_id}").to_lowercase();

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| TtsError::Config(format!("signing key rejected by HMAC: {e}")))?;
    mac.update(to_sign.as_bytes());
    let digest = BASE64.encode(mac.finalize().into_bytes());

    Ok(format!("{CLIENT_ID}::{digest}::{formatted_date}::{trace_id}"))
}

/// Current UTC time in the credential endpoint's expected shape:
/// RFC-1123 with the "GMT" suffix re-appended without a space, lowercased
pub(crate) fn http_date_now() -> String {
    format_http_date(jiff::Timestamp::now())
}

fn format_http_date(ts: jiff::Timestamp) -> String {
    let formatted = ts.strftime("%a, %d %b %Y %H:%M:%S").to_string();
    format!("{formatted}GMT").to_lowercase()
}

/// 32 lowercase hex characters, no dashes
pub(crate) fn new_trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
