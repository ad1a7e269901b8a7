//! HTTP fetcher for marketplace detail pages.
//!
//! Sends a browser-approximating request profile (desktop Chrome UA, Accept,
//! Accept-Language, Referer derived from the target origin, Sec-CH-UA family)
//! with a bounded timeout. Read-only and idempotent against the target; no
//! cookies are stored or replayed.

use std::time::Duration;

use reqwest::Client;

use crate::error::ScrapeError;

/// Fetches raw HTML for a single URL with a bounded per-request budget.
///
/// Failures (timeout, non-2xx, network error) surface as [`ScrapeError`];
/// callers treat every error as "no data from this attempt" and fall back to
/// cached or listing data rather than propagating.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Creates a fetcher with the given total request timeout and User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(4)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches the HTML body of `url`.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::InvalidUrl`] — `url` is not an absolute http(s) URL.
    /// - [`ScrapeError::UnexpectedStatus`] — any non-2xx response.
    /// - [`ScrapeError::EmptyBody`] — 2xx with a blank body.
    /// - [`ScrapeError::Http`] — network failure or timeout.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let referer = origin_of(url).ok_or_else(|| ScrapeError::InvalidUrl {
            url: url.to_owned(),
            reason: "not an absolute http(s) URL".to_owned(),
        })?;

        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::REFERER, &referer)
            .header(
                "sec-ch-ua",
                "\"Chromium\";v=\"124\", \"Google Chrome\";v=\"124\", \"Not-A.Brand\";v=\"99\"",
            )
            .header("sec-ch-ua-mobile", "?0")
            .header("sec-ch-ua-platform", "\"Linux\"")
            .header("upgrade-insecure-requests", "1")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ScrapeError::EmptyBody {
                url: url.to_owned(),
            });
        }
        Ok(body)
    }
}

/// Extracts `scheme://host[:port]` from an absolute URL, used as the Referer.
fn origin_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    let host = parsed.host_str()?;
    let mut origin = format!("{}://{host}", parsed.scheme());
    if let Some(port) = parsed.port() {
        origin.push_str(&format!(":{port}"));
    }
    Some(origin)
}
