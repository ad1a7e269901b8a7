//! Integration tests for `DetailService::get_detail` and `enrich_batch`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Mock expectations pin the exact number of
//! upstream fetches each cache path is allowed, which is the contract under
//! test: memo and fresh persisted records cost zero fetches, everything else
//! costs exactly one.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tradescout_core::{ListingFallback, NormalizedDetail};
use tradescout_detail::{
    enrich_batch, Clock, DetailMemo, DetailService, EnrichItem, InMemoryListingStore,
    ListingRecord, ManualClock,
};
use tradescout_scraper::PageFetcher;

const FRESHNESS_SECS: u64 = 86_400;
const MEMO_TTL_SECS: u64 = 600;

fn start_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

fn build_service(
    store: Arc<InMemoryListingStore>,
    clock: Arc<ManualClock>,
) -> DetailService {
    let fetcher =
        PageFetcher::new(5, "tradescout-test/0.1").expect("failed to build test fetcher");
    let clock: Arc<dyn Clock> = clock;
    let memo = DetailMemo::new(MEMO_TTL_SECS, clock.clone());
    DetailService::new(fetcher, memo, store, FRESHNESS_SECS, clock)
}

/// A fallback rich enough that even a parse miss yields a usable record.
fn usable_fallback() -> ListingFallback {
    ListingFallback {
        title: Some("Stainless Steel Water Bottle".to_owned()),
        price_text: Some("US$ 5 - 8".to_owned()),
        ..ListingFallback::default()
    }
}

fn persisted_json(title: &str, price_text: Option<&str>) -> String {
    let detail = NormalizedDetail {
        source_url: "irrelevant".to_owned(),
        title: title.to_owned(),
        price_text: price_text.map(str::to_owned),
        ..NormalizedDetail::default()
    };
    serde_json::to_string(&detail).expect("fixture serializes")
}

fn seeded_store(
    url: &str,
    detail_json: Option<String>,
    cached_at: Option<chrono::DateTime<Utc>>,
) -> Arc<InMemoryListingStore> {
    let mut record = ListingRecord::new("l1", url);
    record.cached_detail_json = detail_json;
    record.cached_at = cached_at;
    Arc::new(InMemoryListingStore::new(vec![record]))
}

async fn mount_page(server: &MockServer, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/product/p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><h1>Some Product</h1></body></html>"),
        )
        .expect(expected_hits)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Cache walk: memo, persisted freshness, weak-as-miss
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_persisted_record_costs_zero_fetches() {
    let server = MockServer::start().await;
    mount_page(&server, 0).await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let cached_at = start_time() - Duration::seconds(3600);
    let store = seeded_store(
        &url,
        Some(persisted_json("Cached Bottle", Some("US$ 4"))),
        Some(cached_at),
    );
    let service = build_service(store, clock);

    let detail = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    assert_eq!(detail.title, "Cached Bottle");
}

#[tokio::test]
async fn record_aged_exactly_the_window_is_stale() {
    let server = MockServer::start().await;
    mount_page(&server, 1).await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let window = i64::try_from(FRESHNESS_SECS).unwrap();
    let cached_at = start_time() - Duration::seconds(window);
    let store = seeded_store(
        &url,
        Some(persisted_json("Cached Bottle", Some("US$ 4"))),
        Some(cached_at),
    );
    let service = build_service(store.clone(), clock);

    let detail = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    // Refetched: the result comes from the live path, not the stale row.
    assert_eq!(detail.title, "Stainless Steel Water Bottle");

    let restamped = store.snapshot("l1").unwrap();
    assert_eq!(restamped.cached_at, Some(start_time()));
}

#[tokio::test]
async fn record_one_second_inside_the_window_is_fresh() {
    let server = MockServer::start().await;
    mount_page(&server, 0).await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let window = i64::try_from(FRESHNESS_SECS).unwrap();
    let cached_at = start_time() - Duration::seconds(window - 1);
    let store = seeded_store(
        &url,
        Some(persisted_json("Cached Bottle", Some("US$ 4"))),
        Some(cached_at),
    );
    let service = build_service(store, clock);

    let detail = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    assert_eq!(detail.title, "Cached Bottle");
}

#[tokio::test]
async fn huge_freshness_window_clamps_instead_of_panicking() {
    let server = MockServer::start().await;
    mount_page(&server, 0).await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let store = seeded_store(
        &url,
        Some(persisted_json("Cached Bottle", Some("US$ 4"))),
        Some(start_time() - Duration::days(365)),
    );
    let fetcher =
        PageFetcher::new(5, "tradescout-test/0.1").expect("failed to build test fetcher");
    let clock: Arc<dyn Clock> = clock;
    let memo = DetailMemo::new(MEMO_TTL_SECS, clock.clone());
    let service = DetailService::new(fetcher, memo, store, u64::MAX, clock);

    let detail = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    assert_eq!(detail.title, "Cached Bottle");
}

#[tokio::test]
async fn weak_persisted_record_is_a_miss_even_when_fresh() {
    let server = MockServer::start().await;
    mount_page(&server, 1).await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    // Fresh timestamp, but no price information of any kind.
    let store = seeded_store(
        &url,
        Some(persisted_json("Cached Bottle", None)),
        Some(start_time() - Duration::seconds(60)),
    );
    let service = build_service(store, clock);

    let detail = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    assert!(!detail.is_weak());
    assert_eq!(detail.price_text.as_deref(), Some("US$ 5 - 8"));
}

#[tokio::test]
async fn repeated_requests_are_served_from_the_memo() {
    let server = MockServer::start().await;
    mount_page(&server, 1).await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let store = seeded_store(&url, None, None);
    let service = build_service(store, clock);

    for _ in 0..3 {
        let detail = service
            .get_detail("l1", &url, &usable_fallback(), false)
            .await
            .unwrap();
        assert_eq!(detail.title, "Stainless Steel Water Bottle");
    }
}

// ---------------------------------------------------------------------------
// Force refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn force_refresh_bypasses_both_tiers_with_exactly_one_fetch() {
    let server = MockServer::start().await;
    mount_page(&server, 1).await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let cached_at = start_time() - Duration::seconds(60);
    let store = seeded_store(
        &url,
        Some(persisted_json("Cached Bottle", Some("US$ 4"))),
        Some(cached_at),
    );
    let service = build_service(store.clone(), clock.clone());

    // Prime the memo with the cached record.
    service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();

    clock.advance_secs(30);
    let refreshed = service
        .get_detail("l1", &url, &usable_fallback(), true)
        .await
        .unwrap();
    assert_eq!(refreshed.title, "Stainless Steel Water Bottle");

    let record = store.snapshot("l1").unwrap();
    assert_eq!(record.cached_at, Some(start_time() + Duration::seconds(30)));

    // The prime call was served from the fresh persisted row and the
    // follow-up hits the memo, so the forced call is the only fetch.
    let followup = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    assert_eq!(followup.title, "Stainless Steel Water Bottle");
}

#[tokio::test]
async fn force_refresh_overwrites_timestamp_even_when_result_is_weak() {
    let server = MockServer::start().await;
    mount_page(&server, 1).await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let cached_at = start_time() - Duration::seconds(3600);
    let store = seeded_store(
        &url,
        Some(persisted_json("Cached Bottle", Some("US$ 4"))),
        Some(cached_at),
    );
    let service = build_service(store.clone(), clock);

    // Empty fallback + unparseable host: the refreshed record is weak.
    let refreshed = service
        .get_detail("l1", &url, &ListingFallback::default(), true)
        .await
        .unwrap();
    assert!(refreshed.is_weak());

    let record = store.snapshot("l1").unwrap();
    assert_eq!(record.cached_at, Some(start_time()));
    let stored: NormalizedDetail =
        serde_json::from_str(record.cached_detail_json.as_deref().unwrap()).unwrap();
    assert!(stored.is_weak());
}

// ---------------------------------------------------------------------------
// Degradation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_failure_degrades_to_the_listing_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/p1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let store = seeded_store(&url, None, None);
    let service = build_service(store.clone(), clock);

    let detail = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    assert_eq!(detail.title, "Stainless Steel Water Bottle");
    assert_eq!(detail.debug_source, "fallback");

    // Nothing was persisted for a failed attempt.
    let record = store.snapshot("l1").unwrap();
    assert!(record.cached_at.is_none());
}

#[tokio::test]
async fn fetch_failure_prefers_a_stale_persisted_record_over_the_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/p1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let window = i64::try_from(FRESHNESS_SECS).unwrap();
    let stale_at = start_time() - Duration::seconds(window + 100);
    let store = seeded_store(
        &url,
        Some(persisted_json("Cached Bottle", Some("US$ 4"))),
        Some(stale_at),
    );
    let service = build_service(store.clone(), clock);

    let detail = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    assert_eq!(detail.title, "Cached Bottle");

    // The stale row keeps its old timestamp; a failed fetch restamps nothing.
    let record = store.snapshot("l1").unwrap();
    assert_eq!(record.cached_at, Some(stale_at));
}

#[tokio::test]
async fn persist_failure_is_swallowed_and_the_result_still_returned() {
    let server = MockServer::start().await;
    mount_page(&server, 1).await;
    let url = format!("{}/product/p1", server.uri());

    let clock = Arc::new(ManualClock::new(start_time()));
    let store = seeded_store(&url, None, None);
    store.fail_updates(true);
    let service = build_service(store.clone(), clock);

    let detail = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    assert_eq!(detail.title, "Stainless Steel Water Bottle");

    // Memo was still updated: the second call costs no fetch.
    let again = service
        .get_detail("l1", &url, &usable_fallback(), false)
        .await
        .unwrap();
    assert_eq!(again.title, detail.title);
}

// ---------------------------------------------------------------------------
// Batch enrichment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn enrich_batch_keys_results_by_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><h1>Some Product</h1></body></html>"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start_time()));
    let records: Vec<ListingRecord> = (1..=3)
        .map(|i| ListingRecord::new(&format!("l{i}"), &format!("{}/product/p{i}", server.uri())))
        .collect();
    let urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
    let store = Arc::new(InMemoryListingStore::new(records));
    let service = build_service(store, clock);

    let items: Vec<EnrichItem> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| EnrichItem {
            listing_id: format!("l{}", i + 1),
            source_url: url.clone(),
            fallback: usable_fallback(),
        })
        .collect();

    let outcome = enrich_batch(&service, items, 2).await;
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.details.len(), 3);
    for url in &urls {
        assert!(outcome.details.contains_key(url), "missing result for {url}");
    }
}

#[tokio::test]
async fn enrich_batch_reports_unknown_listings_without_dropping_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><h1>Some Product</h1></body></html>"),
        )
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start_time()));
    let known = format!("{}/product/p1", server.uri());
    let store = Arc::new(InMemoryListingStore::new(vec![ListingRecord::new(
        "l1", &known,
    )]));
    let service = build_service(store, clock);

    let items = vec![
        EnrichItem {
            listing_id: "l1".to_owned(),
            source_url: known.clone(),
            fallback: usable_fallback(),
        },
        EnrichItem {
            listing_id: "missing".to_owned(),
            source_url: format!("{}/product/p2", server.uri()),
            fallback: usable_fallback(),
        },
    ];

    let outcome = enrich_batch(&service, items, 5).await;
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.details.len(), 1);
    assert!(outcome.details.contains_key(&known));
}
