// Test doubles and a mock upstream shared by the integration tests.
#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use chat_relay::{
    config::ALLOWED_ORIGINS,
    routes::create_router,
    services::{
        chat_store::{ChatStore, GraphQlError, StoreError},
        completion::{ChatMessage, CompletionApi, CompletionError},
    },
    state::AppState,
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

/// Canned outcome for [`FakeCompletion`].
#[derive(Clone)]
pub enum CompletionOutcome {
    Text(String),
    RateLimited,
    Broken,
}

pub struct FakeCompletion {
    outcome: CompletionOutcome,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl FakeCompletion {
    pub fn new(outcome: CompletionOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(CompletionOutcome::Text(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionApi for FakeCompletion {
    async fn complete(
        &self,
        _model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages;
        match &self.outcome {
            CompletionOutcome::Text(text) => Ok(text.clone()),
            CompletionOutcome::RateLimited => {
                Err(CompletionError::RateLimited("quota".to_string()))
            }
            CompletionOutcome::Broken => {
                Err(CompletionError::MalformedResponse("no choices".to_string()))
            }
        }
    }
}

#[derive(Clone, Copy)]
pub enum StoreOutcome {
    Saved,
    Rejected,
    Unreachable,
}

pub struct FakeStore {
    outcome: StoreOutcome,
    saved: Mutex<Vec<(String, String)>>,
}

impl FakeStore {
    pub fn new(outcome: StoreOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            saved: Mutex::new(Vec::new()),
        })
    }

    pub fn saved(&self) -> Vec<(String, String)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatStore for FakeStore {
    async fn update_chat_title(&self, chat_id: &str, title: &str) -> Result<(), StoreError> {
        match self.outcome {
            StoreOutcome::Saved => {
                self.saved
                    .lock()
                    .unwrap()
                    .push((chat_id.to_string(), title.to_string()));
                Ok(())
            }
            StoreOutcome::Rejected => Err(StoreError::GraphQl(vec![GraphQlError {
                message: "permission denied".to_string(),
                extensions: None,
            }])),
            StoreOutcome::Unreachable => Err(StoreError::Decode("connection reset".to_string())),
        }
    }
}

pub fn app(completion: Arc<FakeCompletion>, store: Arc<FakeStore>) -> Router {
    let state = Arc::new(AppState::new(completion, store));
    create_router(ALLOWED_ORIGINS).with_state(state)
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_text(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, body)
}

/// What the mock upstream answers on each of its two endpoints.
#[derive(Clone)]
pub struct MockUpstreamConfig {
    pub completion_status: StatusCode,
    pub completion_body: Value,
    pub graphql_status: StatusCode,
    pub graphql_body: Value,
}

impl Default for MockUpstreamConfig {
    fn default() -> Self {
        Self {
            completion_status: StatusCode::OK,
            completion_body: json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello from upstream"}}]
            }),
            graphql_status: StatusCode::OK,
            graphql_body: json!({
                "data": {"update_chats_by_pk": {"id": "abc", "title": "Hello from upstream"}}
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    config: MockUpstreamConfig,
    completions: Arc<Mutex<Vec<RecordedRequest>>>,
    mutations: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// A local HTTP server standing in for the completion API and the GraphQL endpoint.
pub struct MockUpstream {
    pub url: String,
    completions: Arc<Mutex<Vec<RecordedRequest>>>,
    mutations: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockUpstream {
    pub async fn start(config: MockUpstreamConfig) -> Self {
        let completions = Arc::new(Mutex::new(Vec::new()));
        let mutations = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            config,
            completions: completions.clone(),
            mutations: mutations.clone(),
        };

        let app = Router::new()
            .route("/v1/chat/completions", post(completions_handler))
            .route("/v1/graphql", post(graphql_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                eprintln!("mock upstream error: {}", e);
            }
        });

        Self {
            url,
            completions,
            mutations,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn openai_base(&self) -> String {
        format!("{}/v1", self.url)
    }

    pub fn graphql_endpoint(&self) -> String {
        format!("{}/v1/graphql", self.url)
    }

    pub fn completions(&self) -> Vec<RecordedRequest> {
        self.completions.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<RecordedRequest> {
        self.mutations.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

async fn completions_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let record = RecordedRequest { headers, body };
    state.completions.lock().unwrap().push(record);
    let body = Json(state.config.completion_body.clone());
    (state.config.completion_status, body).into_response()
}

async fn graphql_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let record = RecordedRequest { headers, body };
    state.mutations.lock().unwrap().push(record);
    let body = Json(state.config.graphql_body.clone());
    (state.config.graphql_status, body).into_response()
}
