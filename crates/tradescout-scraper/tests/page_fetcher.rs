//! Integration tests for `PageFetcher::fetch_html`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Covers the happy path, the browser-profile
//! request headers, and every error variant `fetch_html` can return.

use wiremock::matchers::{header, header_exists, headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tradescout_scraper::{PageFetcher, ScrapeError};

fn test_fetcher() -> PageFetcher {
    PageFetcher::new(5, "tradescout-test/0.1").expect("failed to build test fetcher")
}

#[tokio::test]
async fn fetch_html_returns_the_body_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product-detail/x.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let body = test_fetcher()
        .fetch_html(&format!("{}/product-detail/x.html", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn fetch_html_sends_a_browser_request_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .and(header("user-agent", "tradescout-test/0.1"))
        // wiremock splits comma-separated header values into multiple values.
        .and(headers("accept-language", vec!["en-US", "en;q=0.9"]))
        .and(header("referer", server.uri().as_str()))
        .and(header("sec-ch-ua-mobile", "?0"))
        .and(header("upgrade-insecure-requests", "1"))
        .and(header_exists("accept"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_fetcher()
        .fetch_html(&format!("{}/p", server.uri()))
        .await;
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

#[tokio::test]
async fn fetch_html_rejects_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_fetcher()
        .fetch_html(&format!("{}/p", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScrapeError::UnexpectedStatus { status: 503, .. }),
        "expected UnexpectedStatus, got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_html_rejects_a_blank_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   \n  "))
        .mount(&server)
        .await;

    let err = test_fetcher()
        .fetch_html(&format!("{}/p", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScrapeError::EmptyBody { .. }),
        "expected EmptyBody, got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_html_rejects_relative_and_non_http_urls() {
    let fetcher = test_fetcher();
    for url in ["/product-detail/x.html", "ftp://example.com/x", "not a url"] {
        let err = fetcher.fetch_html(url).await.unwrap_err();
        assert!(
            matches!(err, ScrapeError::InvalidUrl { .. }),
            "expected InvalidUrl for {url}, got: {err:?}"
        );
    }
}
