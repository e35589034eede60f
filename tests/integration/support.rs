//! Fake Voca backend served over HTTP for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Mutex;

/// One request the fake received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: &'static str,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

/// Scripted backend data.
#[derive(Debug, Default)]
pub struct Backend {
    /// Entries of `GET /levels/status`.
    pub levels: Vec<Value>,
    /// Cards served front first, per difficulty level wire string.
    pub cards: HashMap<String, VecDeque<Value>>,
    /// Forced responses by path.
    pub failures: HashMap<&'static str, (StatusCode, Value)>,
    pub requests: Vec<Recorded>,
}

impl Backend {
    fn record(
        &mut self,
        method: &'static str,
        path: &'static str,
        query: HashMap<String, String>,
        body: Option<Value>,
    ) -> Option<Response> {
        self.requests.push(Recorded {
            method,
            path,
            query,
            body,
        });
        self.failures
            .get(path)
            .map(|(status, body)| (*status, Json(body.clone())).into_response())
    }
}

pub type Shared = Arc<Mutex<Backend>>;

/// A running fake backend.
pub struct FakeServer {
    pub base: String,
    pub backend: Shared,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeServer {
    /// Starts a server on an ephemeral port with `backend` as its data.
    pub async fn start(backend: Backend) -> Self {
        let backend = Arc::new(Mutex::new(backend));
        let api = Router::new()
            .route("/levels/status", get(level_status))
            .route("/levels/day/open", post(open_day))
            .route("/cards/today", get(cards_today))
            .route("/cards/next", get(cards_next))
            .route("/review", post(review))
            .with_state(Arc::clone(&backend));
        let router = Router::new().nest("/voca/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });

        Self {
            base: format!("http://{addr}/voca/api"),
            backend,
            _handle: handle,
        }
    }

    /// Forces every request to `path` to answer `status` with `body`.
    pub async fn fail(&self, path: &'static str, status: StatusCode, body: Value) {
        self.backend
            .lock()
            .await
            .failures
            .insert(path, (status, body));
    }

    /// Clears forced failures.
    pub async fn recover(&self) {
        self.backend.lock().await.failures.clear();
    }

    pub async fn requests(&self) -> Vec<Recorded> {
        self.backend.lock().await.requests.clone()
    }

    /// `METHOD path` of every request, in order.
    pub async fn request_lines(&self) -> Vec<String> {
        self.requests()
            .await
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

/// A level status entry.
pub fn level(difficulty_level: &str, open_day: Option<u32>, next_day: Option<u32>) -> Value {
    json!({
        "difficulty_level": difficulty_level,
        "open_day": open_day,
        "next_day": next_day,
        "cycles_completed": 0
    })
}

/// A card for `word` on `day`.
pub fn card(id: u64, word: &str, day: u32) -> Value {
    json!({
        "vocab": {
            "id": id,
            "word": word,
            "meaning": format!("meaning of {word}"),
            "example_en": format!("Please check the **{word}**."),
            "example_kr": null,
            "difficulty_level": "800",
            "day": day
        },
        "leitner_level": 1,
        "next_review_date": "2026-10-20",
        "is_mastered": false
    })
}

fn level_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

async fn level_status(
    State(backend): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut b = backend.lock().await;
    if let Some(forced) = b.record("GET", "/levels/status", query, None) {
        return forced;
    }
    Json(json!({ "levels": b.levels })).into_response()
}

async fn open_day(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut b = backend.lock().await;
    if let Some(forced) = b.record("POST", "/levels/day/open", HashMap::new(), Some(body.clone())) {
        return forced;
    }

    let wanted = level_key(&body["difficulty_level"]);
    let day = body["day"].clone();
    for entry in &mut b.levels {
        if level_key(&entry["difficulty_level"]) == wanted {
            entry["open_day"] = day.clone();
            entry["next_day"] = Value::Null;
        }
    }
    Json(json!({ "day": day })).into_response()
}

fn serve_card(b: &Backend, query: &HashMap<String, String>) -> Response {
    let level = query.get("difficulty_level").cloned().unwrap_or_default();
    match b.cards.get(&level).and_then(VecDeque::front) {
        Some(card) => Json(card.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}

async fn cards_today(
    State(backend): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut b = backend.lock().await;
    if let Some(forced) = b.record("GET", "/cards/today", query.clone(), None) {
        return forced;
    }
    serve_card(&b, &query)
}

async fn cards_next(
    State(backend): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut b = backend.lock().await;
    if let Some(forced) = b.record("GET", "/cards/next", query.clone(), None) {
        return forced;
    }
    serve_card(&b, &query)
}

async fn review(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut b = backend.lock().await;
    if let Some(forced) = b.record("POST", "/review", HashMap::new(), Some(body.clone())) {
        return forced;
    }

    for queue in b.cards.values_mut() {
        if queue.front().map(|c| &c["vocab"]["id"]) == Some(&body["vocab_id"]) {
            queue.pop_front();
        }
    }
    Json(json!({
        "user_id": body["user_id"],
        "vocab_id": body["vocab_id"],
        "grade": body["grade"],
        "leitner_level": 2,
        "next_review_date": "2026-10-22",
        "is_mastered": false,
        "studied_at": "2026-10-19T09:30:00"
    }))
    .into_response()
}
