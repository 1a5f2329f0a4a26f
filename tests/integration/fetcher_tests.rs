use crate::common::{
    call_log_page, proxy_identity, CALL_LOG_PATH, PROXIED_CALL_LOG_URL, TEST_USER_AGENT,
};
use dispatch_scraper::proxy::ProxyIdentity;
use dispatch_scraper::requester::{
    classify, FailureKind, FetchError, HttpPageFetcher, PageFetcher, RequestMethod, RequestSpec,
};
use dispatch_scraper::response::extract_call_relative_urls;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post_spec() -> RequestSpec {
    RequestSpec {
        method: RequestMethod::PostForm,
        url: PROXIED_CALL_LOG_URL.to_string(),
        user_agent: TEST_USER_AGENT.to_string(),
        form: vec![
            ("ddl-state".to_string(), "UT".to_string()),
            ("ddl-county".to_string(), "Grand".to_string()),
        ],
    }
}

#[tokio::test]
async fn test_post_is_routed_through_proxy() {
    let proxy = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CALL_LOG_PATH))
        .and(header("user-agent", TEST_USER_AGENT))
        .and(body_string_contains("ddl-state=UT"))
        .and(body_string_contains("ddl-county=Grand"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(call_log_page(&["/calls/a.mp3"])),
        )
        .expect(1)
        .mount(&proxy)
        .await;

    let mut fetcher = HttpPageFetcher::new();
    let response = fetcher
        .fetch(&post_spec(), &proxy_identity(&proxy), Duration::from_secs(5))
        .await
        .expect("Fetch through proxy failed");

    assert_eq!(response.status, 200);
    assert_eq!(
        extract_call_relative_urls(&response.body).unwrap(),
        vec!["/calls/a.mp3"]
    );
}

#[tokio::test]
async fn test_get_without_form() {
    let proxy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CALL_LOG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(call_log_page(&[])))
        .expect(1)
        .mount(&proxy)
        .await;

    let spec = RequestSpec {
        method: RequestMethod::Get,
        form: vec![],
        ..post_spec()
    };

    let mut fetcher = HttpPageFetcher::new();
    let response = fetcher
        .fetch(&spec, &proxy_identity(&proxy), Duration::from_secs(5))
        .await
        .expect("Fetch through proxy failed");

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    for (status, expected) in [
        (429, FailureKind::RateLimited),
        (500, FailureKind::HttpStatus(500)),
        (400, FailureKind::HttpStatus(400)),
    ] {
        let proxy = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CALL_LOG_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&proxy)
            .await;

        let mut fetcher = HttpPageFetcher::new();
        let error = fetcher
            .fetch(&post_spec(), &proxy_identity(&proxy), Duration::from_secs(5))
            .await
            .expect_err("Error status should fail the fetch");

        assert!(matches!(error, FetchError::HttpStatus { .. }));
        assert_eq!(classify(&error), expected);
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let proxy = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(call_log_page(&[]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&proxy)
        .await;

    let mut fetcher = HttpPageFetcher::new();
    let error = fetcher
        .fetch(&post_spec(), &proxy_identity(&proxy), Duration::from_millis(300))
        .await
        .expect_err("Request should time out");

    assert_eq!(classify(&error), FailureKind::Timeout);
}

#[tokio::test]
async fn test_redirect_loop_is_too_many_redirects() {
    let proxy = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CALL_LOG_PATH))
        .respond_with(ResponseTemplate::new(302).insert_header("location", PROXIED_CALL_LOG_URL))
        .mount(&proxy)
        .await;

    Mock::given(method("GET"))
        .and(path(CALL_LOG_PATH))
        .respond_with(ResponseTemplate::new(302).insert_header("location", PROXIED_CALL_LOG_URL))
        .mount(&proxy)
        .await;

    let mut fetcher = HttpPageFetcher::new();
    let error = fetcher
        .fetch(&post_spec(), &proxy_identity(&proxy), Duration::from_secs(5))
        .await
        .expect_err("Redirect loop should fail");

    assert_eq!(classify(&error), FailureKind::TooManyRedirects);
}

#[tokio::test]
async fn test_unreachable_proxy_is_transport_error() {
    // Bind and drop a listener so the port is closed
    let address = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        ProxyIdentity::new("127.0.0.1", port)
    };

    let mut fetcher = HttpPageFetcher::new();
    let error = fetcher
        .fetch(&post_spec(), &address, Duration::from_secs(5))
        .await
        .expect_err("Closed proxy port should fail");

    assert_eq!(classify(&error), FailureKind::Transport);
}
