//! Naver Maps geocoder against a mock HTTP server.

use std::time::Duration;

use fieldwalk_core::ResolutionCause;
use fieldwalk_ingest::{Geocoder, NaverGeocoder};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEOCODE_PATH: &str = "/map-geocode/v2/geocode";

fn geocoder(server: &MockServer, timeout: Duration) -> NaverGeocoder {
    let client = reqwest::Client::builder().timeout(timeout).build().unwrap();
    NaverGeocoder::new(
        client,
        &format!("{}{GEOCODE_PATH}", server.uri()),
        "key-id",
        "secret",
    )
    .expect("valid geocoder url")
}

#[tokio::test]
async fn test_resolves_first_candidate_with_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .and(query_param("query", "서울 중구 세종대로 110"))
        .and(header("X-NCP-APIGW-API-KEY-ID", "key-id"))
        .and(header("X-NCP-APIGW-API-KEY", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "addresses": [{
                "roadAddress": "서울특별시 중구 세종대로 110",
                "x": "126.9783882",
                "y": "37.5666103",
                "addressElements": [
                    {"types": ["SIDO"], "longName": "서울특별시"},
                    {"types": ["POSTAL_CODE"], "longName": "04524"}
                ]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let geo = geocoder(&server, Duration::from_secs(5))
        .resolve("서울 중구 세종대로 110")
        .await
        .unwrap();

    assert_eq!(geo.x, 126.9783882);
    assert_eq!(geo.y, 37.5666103);
    assert_eq!(geo.postal_code.as_deref(), Some("04524"));
}

#[tokio::test]
async fn test_empty_candidate_list_is_no_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "OK", "addresses": []})),
        )
        .mount(&server)
        .await;

    let failure = geocoder(&server, Duration::from_secs(5))
        .resolve("nowhere")
        .await
        .unwrap_err();

    assert_eq!(failure.address, "nowhere");
    assert_eq!(failure.cause, ResolutionCause::NoCandidates);
}

#[tokio::test]
async fn test_provider_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let failure = geocoder(&server, Duration::from_secs(5))
        .resolve("anywhere")
        .await
        .unwrap_err();

    assert_eq!(failure.cause, ResolutionCause::Status(401));
}

#[tokio::test]
async fn test_garbage_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let failure = geocoder(&server, Duration::from_secs(5))
        .resolve("anywhere")
        .await
        .unwrap_err();

    assert!(matches!(failure.cause, ResolutionCause::Malformed(_)));
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"addresses": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let failure = geocoder(&server, Duration::from_millis(100))
        .resolve("anywhere")
        .await
        .unwrap_err();

    assert_eq!(failure.cause, ResolutionCause::Timeout);
}
