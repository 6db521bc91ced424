use httpmock::prelude::*;
use serde_json::json;

use mealscan_core::config::{RetrySettings, VisionBackend, VisionSettings};
use mealscan_core::traits::ImageAnalyzer;
use mealscan_core::types::RawSignal;
use mealscan_vision::remote::{parse_keywords, sniff_mime};
use mealscan_vision::{RemoteAnalyzer, VisionError};

const PATH: &str = "/models/test-model:generateContent";

fn settings(endpoint: String) -> VisionSettings {
    VisionSettings {
        backend: VisionBackend::Remote,
        api_key: Some("test-key".into()),
        api_model: "test-model".into(),
        endpoint,
        timeout_secs: 5,
        retry: RetrySettings { max_attempts: 3, base_delay_ms: 1, max_delay_ms: 2 },
        ..VisionSettings::default()
    }
}

fn vocabulary() -> Vec<String> { vec!["ごはん".into(), "味噌汁".into(), "鮭".into()] }

#[tokio::test]
async fn analyze_returns_keywords_from_response_text() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(PATH).header("x-goog-api-key", "test-key").body_contains("ごはん, 味噌汁, 鮭");
            then.status(200).json_body(json!({
                "candidates": [{ "content": { "parts": [{ "text": "ごはん, 味噌汁、鮭\n" }] } }]
            }));
        })
        .await;

    let analyzer = RemoteAnalyzer::new(&settings(server.base_url()), vocabulary()).expect("analyzer");
    let signal = analyzer.analyze(b"\xff\xd8\xff fake jpeg").await.expect("analyze");

    mock.assert_async().await;
    assert_eq!(signal, RawSignal::Keywords(vec!["ごはん".into(), "味噌汁".into(), "鮭".into()]));
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(503).body("overloaded");
        })
        .await;

    let analyzer = RemoteAnalyzer::new(&settings(server.base_url()), vocabulary()).expect("analyzer");
    let err = analyzer.analyze(b"img").await.expect_err("all attempts fail");

    assert_eq!(mock.hits_async().await, 3);
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(400).body("bad image");
        })
        .await;

    let analyzer = RemoteAnalyzer::new(&settings(server.base_url()), vocabulary()).expect("analyzer");
    assert!(analyzer.analyze(b"img").await.is_err());
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn empty_candidates_are_malformed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(json!({ "candidates": [] }));
        })
        .await;

    let analyzer = RemoteAnalyzer::new(&settings(server.base_url()), vocabulary()).expect("analyzer");
    let err = analyzer.analyze(b"img").await.expect_err("no text");
    assert!(matches!(err.downcast_ref::<VisionError>(), Some(VisionError::Malformed(_))));
}

#[test]
fn missing_api_key_is_rejected() {
    std::env::remove_var(mealscan_vision::remote::API_KEY_ENV);
    let mut s = settings("http://localhost".into());
    s.api_key = None;
    assert!(matches!(RemoteAnalyzer::new(&s, vocabulary()), Err(VisionError::MissingApiKey)));
}

#[test]
fn prompt_lists_vocabulary() {
    let analyzer = RemoteAnalyzer::new(&settings("http://localhost".into()), vocabulary()).expect("analyzer");
    assert!(analyzer.prompt().ends_with("List: ごはん, 味噌汁, 鮭"));
}

#[test]
fn keyword_parsing_and_mime_sniffing() {
    assert_eq!(parse_keywords(" 納豆 ,, 卵、 "), vec!["納豆".to_string(), "卵".to_string()]);
    assert!(parse_keywords("  ").is_empty());
    assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n...."), "image/png");
    assert_eq!(sniff_mime(b"\xff\xd8\xff\xe0"), "image/jpeg");
}
