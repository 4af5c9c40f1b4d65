use std::{sync::OnceLock, time::Duration};

use reqwest::Client;

/// Common HTTP client reused for both upstream round trips
///
/// The timeout bounds the credential-issuing call and the synthesis call;
/// neither endpoint is expected to stream.
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                .timeout(Duration::from_secs(60))
                .pool_idle_timeout(Some(Duration::from_secs(5)))
                .tcp_nodelay(true)
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .build()
                .expect("Failed to build default HTTP client")
        })
        .clone()
}
