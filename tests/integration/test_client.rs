//! Integration tests for the HTTP backend client.
//!
//! Each test serves a fake backend on an ephemeral port and talks to it
//! through `ApiClient` over real HTTP.

mod support;

use std::collections::HashMap;
use std::path::PathBuf;

use axum::http::StatusCode;
use serde_json::json;
use support::{card, level, Backend, FakeServer};
use voca_session::{
    ApiClient, CardEndpoint, Config, DifficultyLevel, Grade, StudyBackend, VocaError,
};

/// Path to the sample config fixture.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

// ============================================================================
// Level Status
// ============================================================================

#[tokio::test]
async fn test_level_statuses_sends_user_id() {
    let server = FakeServer::start(Backend {
        levels: vec![level("600", Some(2), None), level("800", None, Some(4))],
        ..Backend::default()
    })
    .await;
    let client = ApiClient::new(&server.base).expect("Failed to build client");

    let levels = client.level_statuses(9).await.expect("Request failed");

    assert_eq!(levels.len(), 2);
    assert!(levels[0].is_for(DifficultyLevel::L600));
    assert_eq!(levels[1].next_day(), Some(4));

    let requests = server.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query.get("user_id").map(String::as_str), Some("9"));
}

#[tokio::test]
async fn test_numeric_difficulty_level_from_server() {
    let server = FakeServer::start(Backend {
        levels: vec![json!({"difficulty_level": 900, "open_day": 1})],
        ..Backend::default()
    })
    .await;
    let client = ApiClient::new(&server.base).expect("Failed to build client");

    let levels = client.level_statuses(1).await.expect("Request failed");
    assert!(levels[0].is_for(DifficultyLevel::L900));
    assert_eq!(levels[0].open_day(), Some(1));
}

#[tokio::test]
async fn test_server_detail_is_propagated() {
    let server = FakeServer::start(Backend::default()).await;
    server
        .fail(
            "/levels/status",
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"detail": "database unavailable"}),
        )
        .await;
    let client = ApiClient::new(&server.base).expect("Failed to build client");

    let err = client.level_statuses(1).await.unwrap_err();
    assert!(matches!(err, VocaError::Network { .. }));
    assert_eq!(err.to_string(), "database unavailable");
}

#[tokio::test]
async fn test_fallback_message_without_detail() {
    let server = FakeServer::start(Backend::default()).await;
    server
        .fail("/levels/status", StatusCode::BAD_GATEWAY, json!({}))
        .await;
    server
        .fail("/review", StatusCode::UNPROCESSABLE_ENTITY, json!({"detail": [{"msg": "bad grade"}]}))
        .await;
    let client = ApiClient::new(&server.base).expect("Failed to build client");

    let err = client.level_statuses(1).await.unwrap_err();
    assert_eq!(err.to_string(), "failed to load level status");

    let err = client.submit_review(1, 5, Grade::Good).await.unwrap_err();
    assert_eq!(err.to_string(), "review failed");
}

#[tokio::test]
async fn test_undecodable_body_is_network_error() {
    let server = FakeServer::start(Backend {
        levels: vec![json!({"open_day": 1})],
        ..Backend::default()
    })
    .await;
    let client = ApiClient::new(&server.base).expect("Failed to build client");

    let err = client.level_statuses(1).await.unwrap_err();
    assert!(matches!(err, VocaError::Network { .. }));
    assert!(err.to_string().starts_with("invalid response body"));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    drop(listener);

    let client = ApiClient::new(format!("http://{addr}/voca/api")).expect("Failed to build client");
    let err = client.level_statuses(1).await.unwrap_err();

    assert!(matches!(err, VocaError::Network { .. }));
    assert!(err.to_string().starts_with("failed to load level status: "));
}

// ============================================================================
// Open Day
// ============================================================================

#[tokio::test]
async fn test_open_day_posts_level_and_day() {
    let server = FakeServer::start(Backend {
        levels: vec![level("800", None, Some(3))],
        ..Backend::default()
    })
    .await;
    let client = ApiClient::new(&server.base).expect("Failed to build client");

    let day = client
        .open_day(4, DifficultyLevel::L800, 3)
        .await
        .expect("Request failed");
    assert_eq!(day, 3);

    let requests = server.requests().await;
    assert_eq!(
        requests[0].body,
        Some(json!({"user_id": 4, "difficulty_level": "800", "day": 3}))
    );
}

// ============================================================================
// Cards
// ============================================================================

#[tokio::test]
async fn test_today_card_query() {
    let server = FakeServer::start(Backend {
        cards: HashMap::from([("800".to_string(), [card(11, "invoice", 2)].into())]),
        ..Backend::default()
    })
    .await;
    let client = ApiClient::new(&server.base).expect("Failed to build client");

    let card = client
        .today_card(5, DifficultyLevel::L800, 2)
        .await
        .expect("Request failed");
    assert_eq!(card.vocab_id(), 11);
    assert_eq!(card.leitner_label(), "1");

    let requests = server.requests().await;
    assert_eq!(requests[0].path, "/cards/today");
    assert_eq!(
        requests[0].query,
        HashMap::from([
            ("user_id".to_string(), "5".to_string()),
            ("difficulty_level".to_string(), "800".to_string()),
        ])
    );
}

#[tokio::test]
async fn test_next_card_endpoint_sends_day() {
    let server = FakeServer::start(Backend {
        cards: HashMap::from([("600".to_string(), [card(3, "lease", 6)].into())]),
        ..Backend::default()
    })
    .await;
    let client = ApiClient::new(&server.base)
        .expect("Failed to build client")
        .with_card_endpoint(CardEndpoint::Next);

    client
        .today_card(1, DifficultyLevel::L600, 6)
        .await
        .expect("Request failed");

    let requests = server.requests().await;
    assert_eq!(requests[0].path, "/cards/next");
    assert_eq!(requests[0].query.get("day").map(String::as_str), Some("6"));
}

#[tokio::test]
async fn test_missing_card_is_not_found() {
    let server = FakeServer::start(Backend::default()).await;
    let client = ApiClient::new(&server.base).expect("Failed to build client");

    let err = client
        .today_card(1, DifficultyLevel::L800, 5)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "no vocabulary for Day 5");

    server
        .fail(
            "/cards/today",
            StatusCode::NOT_FOUND,
            json!({"detail": "no cards due today"}),
        )
        .await;
    let err = client
        .today_card(1, DifficultyLevel::L800, 5)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "no cards due today");
}

// ============================================================================
// Review
// ============================================================================

#[tokio::test]
async fn test_review_sends_grade_literal() {
    let server = FakeServer::start(Backend::default()).await;
    let client = ApiClient::new(&server.base).expect("Failed to build client");

    let ack = client
        .submit_review(2, 77, Grade::Perfect)
        .await
        .expect("Request failed");
    assert_eq!(ack.grade, Some(Grade::Perfect));
    assert_eq!(ack.leitner_level, Some(2));
    assert!(ack.studied_at.is_some());

    let requests = server.requests().await;
    assert_eq!(
        requests[0].body,
        Some(json!({"user_id": 2, "vocab_id": 77, "grade": "perfect"}))
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_sample_config_loads() {
    let config_path = fixture_path().join("voca.json");
    assert!(
        config_path.exists(),
        "Config fixture not found at: {config_path:?}"
    );

    let config = Config::load_from_file(&config_path).expect("Failed to load config");
    assert_eq!(config.user_id, 7);
    assert_eq!(config.difficulty_level, DifficultyLevel::L600);
    assert_eq!(config.card_endpoint, CardEndpoint::Next);

    let client = ApiClient::from_config(&config).expect("Failed to build client");
    assert_eq!(client.base(), "http://127.0.0.1:8000/voca/api");
}
