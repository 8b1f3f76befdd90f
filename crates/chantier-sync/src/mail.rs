//! Mail-service configuration probe.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::UpstreamError;
use crate::cache::TtlCache;

/// How long a probe result is reused before the service is asked again.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    configured: bool,
}

/// Asks the mail service whether outbound email is configured, caching the
/// answer for a bounded time.
pub struct MailStatusProbe {
    client: reqwest::Client,
    base_url: String,
    cache: Mutex<TtlCache<bool>>,
}

impl MailStatusProbe {
    pub fn new(base_url: &str) -> Self {
        Self::with_ttl(base_url, DEFAULT_TTL)
    }

    pub fn with_ttl(base_url: &str, ttl: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: Mutex::new(TtlCache::new(ttl)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the mail service reports itself configured.
    ///
    /// A cached answer is returned while fresh unless `force_refresh` is set.
    /// On failure the previous answer stays cached.
    pub async fn is_configured(&self, force_refresh: bool) -> Result<bool, UpstreamError> {
        let mut cache = self.cache.lock().await;
        let result = cache.refresh(force_refresh, || self.fetch()).await;
        if let Err(e) = &result {
            warn!(error = %e, "mail status probe failed");
        }
        result
    }

    /// Drop the cached answer so the next call hits the service.
    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }

    async fn fetch(&self) -> Result<bool, UpstreamError> {
        let url = format!("{}/api/email/status", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: StatusResponse = resp.json().await?;
        info!(url = %url, configured = parsed.configured, "mail status fetched");
        Ok(parsed.configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on port 1, so any network attempt fails fast.
    const DEAD_URL: &str = "http://127.0.0.1:1/";

    #[test]
    fn base_url_is_trimmed() {
        let probe = MailStatusProbe::new(DEAD_URL);
        assert_eq!(probe.base_url(), "http://127.0.0.1:1");
    }

    #[tokio::test]
    async fn fresh_cached_answer_skips_network() {
        let probe = MailStatusProbe::new(DEAD_URL);
        probe.cache.lock().await.set(true);
        assert!(probe.is_configured(false).await.unwrap());
    }

    #[tokio::test]
    async fn forced_refresh_failure_keeps_cached_answer() {
        let probe = MailStatusProbe::new(DEAD_URL);
        probe.cache.lock().await.set(true);
        assert!(probe.is_configured(true).await.is_err());
        assert!(probe.is_configured(false).await.unwrap());
    }

    #[tokio::test]
    async fn invalidated_cache_goes_to_network() {
        let probe = MailStatusProbe::new(DEAD_URL);
        probe.cache.lock().await.set(false);
        probe.invalidate().await;
        assert!(probe.is_configured(false).await.is_err());
    }

    #[test]
    fn status_body_defaults_to_unconfigured() {
        let parsed: StatusResponse = serde_json::from_str("{}").unwrap();
        assert!(!parsed.configured);
    }
}
