use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use watchdog_core::{CallContext, WatchdogError};
use watchdog_transport::{build_client, ClientOptions, RetryPolicy, RetryableTransport};

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        multiplier: 2.0,
    }
}

fn transport(policy: RetryPolicy) -> RetryableTransport {
    let client = build_client(&ClientOptions::default()).unwrap();
    RetryableTransport::new(client, policy)
}

fn get(transport: &RetryableTransport, url: String) -> reqwest::Request {
    transport.client().get(url).build().unwrap()
}

#[derive(Debug, Deserialize)]
struct Reading {
    value: u32,
}

#[tokio::test]
async fn persistent_server_error_makes_max_retries_plus_one_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let transport = transport(fast_policy(3));
    let ctx = CallContext::new(CancellationToken::new());
    let err = transport
        .execute(&ctx, get(&transport, format!("{}/flaky", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, WatchdogError::Status { status: 500, .. }));
}

#[tokio::test]
async fn permanent_status_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(fast_policy(3));
    let ctx = CallContext::new(CancellationToken::new());
    let err = transport
        .execute(&ctx, get(&transport, format!("{}/missing", server.uri())))
        .await
        .unwrap_err();

    match err {
        WatchdogError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "Not Found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reading"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reading"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(fast_policy(3));
    let ctx = CallContext::new(CancellationToken::new());
    let reading: Reading = transport
        .get_json(&ctx, get(&transport, format!("{}/reading", server.uri())))
        .await
        .unwrap();

    assert_eq!(reading.value, 7);
}

#[tokio::test]
async fn rate_limited_responses_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let transport = transport(fast_policy(2));
    let ctx = CallContext::new(CancellationToken::new());
    let err = transport
        .execute(&ctx, get(&transport, server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, WatchdogError::Status { status: 429, .. }));
}

#[tokio::test]
async fn cancellation_interrupts_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(RetryPolicy {
        max_retries: 5,
        initial_backoff: Duration::from_secs(60),
        max_backoff: Duration::from_secs(60),
        multiplier: 2.0,
    });
    let token = CancellationToken::new();
    let ctx = CallContext::new(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let started = Instant::now();
    let err = transport
        .execute(&ctx, get(&transport, server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, WatchdogError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
    canceller.await.unwrap();
}

#[tokio::test]
async fn deadline_covers_all_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = transport(RetryPolicy {
        max_retries: 50,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(100),
        multiplier: 1.0,
    });
    let ctx = CallContext::with_timeout(CancellationToken::new(), Duration::from_millis(350));

    let started = Instant::now();
    let err = transport
        .execute(&ctx, get(&transport, server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, WatchdogError::DeadlineExceeded));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn malformed_json_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(fast_policy(3));
    let ctx = CallContext::new(CancellationToken::new());
    let err = transport
        .get_json::<Reading>(&ctx, get(&transport, server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, WatchdogError::Malformed(_)));
}

#[tokio::test]
async fn unreachable_host_exhausts_retries() {
    // Bind then drop a listener so the port is (almost certainly) closed.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let transport = transport(fast_policy(2));
    let ctx = CallContext::new(CancellationToken::new());
    let err = transport
        .execute(&ctx, get(&transport, format!("http://{addr}/")))
        .await
        .unwrap_err();

    assert!(matches!(err, WatchdogError::Connect(_) | WatchdogError::Network(_) | WatchdogError::Timeout(_)));
}
