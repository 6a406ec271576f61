//! Mock catalog service for HTTP and CLI tests.
//!
//! Serves the three catalog endpoints with axum on `127.0.0.1:0` and
//! records every request it receives.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

/// A canned failure: status plus JSON body.
#[derive(Clone)]
pub struct Failure {
    pub status: u16,
    pub body: Value,
}

#[derive(Default)]
pub struct Recorded {
    pub list_queries: Vec<HashMap<String, String>>,
    pub batches: Vec<Value>,
    pub chat_messages: Vec<String>,
}

#[derive(Clone)]
pub struct MockCatalog {
    pub records: Arc<Vec<Value>>,
    pub reply: String,
    pub failure: Option<Failure>,
    pub recorded: Arc<Mutex<Recorded>>,
}

impl MockCatalog {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records: Arc::new(records),
            reply: "Room 101 is available".to_string(),
            failure: None,
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    /// Every endpoint answers with `status` and `body`.
    pub fn failing(mut self, status: u16, body: Value) -> Self {
        self.failure = Some(Failure { status, body });
        self
    }

    fn fail(&self) -> Option<Response> {
        self.failure.as_ref().map(|f| {
            let status = StatusCode::from_u16(f.status).unwrap();
            (status, Json(f.body.clone())).into_response()
        })
    }
}

pub fn room(n: usize) -> Value {
    json!({
        "id": format!("doc-{}", n),
        "page_content": format!("Room {}", n),
        "metadata": {
            "description": "Quiet room",
            "room_number": format!("{}", 100 + n),
            "room_size": 20,
            "is_booked": n % 2 == 0,
        }
    })
}

pub fn rooms(count: usize) -> Vec<Value> {
    (0..count).map(room).collect()
}

async fn list(
    State(mock): State<MockCatalog>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    mock.recorded.lock().unwrap().list_queries.push(query.clone());
    if let Some(resp) = mock.fail() {
        return resp;
    }
    let skip: usize = query.get("skip").and_then(|s| s.parse().ok()).unwrap_or(0);
    let limit: usize = query.get("limit").and_then(|s| s.parse().ok()).unwrap_or(10);
    let page: Vec<Value> = mock.records.iter().skip(skip).take(limit).cloned().collect();
    Json(Value::Array(page)).into_response()
}

async fn add(State(mock): State<MockCatalog>, Json(batch): Json<Value>) -> Response {
    mock.recorded.lock().unwrap().batches.push(batch);
    if let Some(resp) = mock.fail() {
        return resp;
    }
    Json(json!({ "status": "ok" })).into_response()
}

async fn chat(
    State(mock): State<MockCatalog>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let msg = query.get("msg").cloned().unwrap_or_default();
    mock.recorded.lock().unwrap().chat_messages.push(msg);
    if let Some(resp) = mock.fail() {
        return resp;
    }
    mock.reply.clone().into_response()
}

fn router(mock: MockCatalog) -> Router {
    Router::new()
        .route("/get-documents/", get(list))
        .route("/add-documents", post(add))
        .route("/chat/", post(chat))
        .with_state(mock)
}

/// Serves `mock` on the current runtime and returns its base URL.
pub async fn serve(mock: MockCatalog) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(mock)).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serves `mock` from a background thread with its own runtime, for
/// synchronous tests that run the CLI binary.
pub fn serve_in_background(mock: MockCatalog) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router(mock)).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}
