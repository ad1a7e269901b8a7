/// Runtime configuration for the detail pipeline.
///
/// All knobs are env-driven with defaults suitable for development; see
/// [`crate::config::load_app_config`] for the variable names.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,

    /// Total per-request budget for a detail-page fetch, in seconds.
    pub fetch_timeout_secs: u64,

    /// Desktop-browser User-Agent sent with every fetch.
    pub user_agent: String,

    /// TTL for the process-local detail memo, in seconds.
    pub memo_ttl_secs: u64,

    /// Maximum age at which a persisted detail record is reused without a
    /// live re-fetch, in seconds. The boundary is exclusive: a record aged
    /// exactly this many seconds is stale.
    pub freshness_window_secs: u64,

    /// Worker bound for batch enrichment. Kept small to avoid tripping
    /// upstream rate limiting.
    pub batch_concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            fetch_timeout_secs: 8,
            user_agent: default_user_agent().to_owned(),
            memo_ttl_secs: 600,
            freshness_window_secs: 86_400,
            batch_concurrency: 5,
        }
    }
}

/// The desktop Chrome profile used when no override is configured.
#[must_use]
pub fn default_user_agent() -> &'static str {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
}
