use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{Result, TtsError};
use crate::http_client::http_client;

/// Fixed voice catalog endpoint
const VOICE_LIST_URL: &str = "https://eastus.api.speech.microsoft.com/cognitiveservices/voices/list";

/// Catalog entries are refreshed when older than this
const CACHE_TTL_SECS: i64 = 4 * 60 * 60;

/// The catalog endpoint expects a browser-looking client
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36 Edg/107.0.1418.26";

struct CachedList {
    entries: Arc<Vec<Value>>,
    fetched_at: i64,
}

/// Time-boxed cache over the upstream voice catalog
///
/// Same whole-value-replacement shape as the session credential: read
/// mostly, refreshed in place, never partially mutated.
pub struct VoiceCatalog {
    client: Client,
    list_url: String,
    cache: Mutex<Option<CachedList>>,
}

impl VoiceCatalog {
    pub fn new(list_url: Option<String>) -> Self {
        Self {
            client: http_client(),
            list_url: list_url.unwrap_or_else(|| VOICE_LIST_URL.to_string()),
            cache: Mutex::new(None),
        }
    }

    /// List voice descriptors, optionally filtered by locale substring
    pub async fn list(&self, locale_filter: Option<&str>) -> Result<Vec<Value>> {
        let entries = self.entries().await?;
        Ok(filter_by_locale(&entries, locale_filter))
    }

    async fn entries(&self) -> Result<Arc<Vec<Value>>> {
        let mut slot = self.cache.lock().await;
        let now = jiff::Timestamp::now().as_second();

        if let Some(cached) = slot.as_ref()
            && is_fresh(cached.fetched_at, now)
        {
            tracing::debug!(
                remaining_secs = cached.fetched_at + CACHE_TTL_SECS - now,
                "serving cached voice list"
            );
            return Ok(Arc::clone(&cached.entries));
        }

        tracing::debug!("fetching fresh voice list");
        let response = self
            .client
            .get(&self.list_url)
            .header(http::header::USER_AGENT, BROWSER_USER_AGENT)
            .header("X-Ms-Useragent", "SpeechStudio/2021.05.001")
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(http::header::ORIGIN, "https://azure.microsoft.com")
            .header(http::header::REFERER, "https://azure.microsoft.com")
            .send()
            .await
            .map_err(|e| TtsError::VoiceList(format!("failed to reach voice list endpoint: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TtsError::VoiceList(format!("voice list endpoint returned {status}")));
        }

        let entries: Vec<Value> = response
            .json()
            .await
            .map_err(|e| TtsError::VoiceList(format!("unexpected voice list body: {e}")))?;

        let entries = Arc::new(entries);
        *slot = Some(CachedList {
            entries: Arc::clone(&entries),
            fetched_at: now,
        });

        Ok(entries)
    }
}

const fn is_fresh(fetched_at: i64, now: i64) -> bool {
    now - fetched_at < CACHE_TTL_SECS
}

/// Case-insensitive substring match on each descriptor's `Locale` field;
/// an absent or empty filter returns everything
fn filter_by_locale(entries: &[Value], locale_filter: Option<&str>) -> Vec<Value> {
    let filter = locale_filter.map(str::to_lowercase).filter(|f| !f.is_empty());

    match filter {
        None => entries.to_vec(),
        Some(filter) => entries
            .iter()
            .filter(|entry| {
                entry
                    .get("Locale")
                    .and_then(Value::as_str)
                    .is_some_and(|locale| locale.to_lowercase().contains(&filter))
            })
            .cloned()
            .collect(),
    }
}
