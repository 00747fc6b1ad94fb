//! In-process stand-in for the operations backend.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use services::services::{
    api_client::ApiClient,
    notification::{Notifier, Toast},
    pages::AppContext,
    query_cache::QueryCache,
};
use uuid::Uuid;

#[derive(Default)]
struct StubState {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    requests: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
    delay_ms: AtomicU64,
}

#[derive(Clone, Default)]
pub struct StubBackend {
    state: Arc<StubState>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `/api/<collection>` with records.
    pub fn seed(&self, collection: &str, records: Vec<Value>) {
        self.state
            .collections
            .lock()
            .unwrap()
            .insert(collection.to_string(), records);
    }

    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.state
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Answers `method path` with `{"message": message}` and `status` until cleared.
    pub fn fail(&self, method: &str, path: &str, status: u16, message: &str) {
        self.fail_raw(method, path, status, &json!({ "message": message }).to_string());
    }

    pub fn fail_raw(&self, method: &str, path: &str, status: u16, body: &str) {
        self.state
            .failures
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), (status, body.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state.failures.lock().unwrap().clear();
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of requests received for `method path` (query string ignored).
    pub fn count(&self, method: &str, path: &str) -> usize {
        let wanted = format!("{method} {path}");
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| **r == wanted)
            .count()
    }

    async fn enter(&self, method: &str, path: &str) -> Option<Response> {
        let line = format!("{method} {path}");
        self.state.requests.lock().unwrap().push(line.clone());

        let delay = self.state.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let failure = self.state.failures.lock().unwrap().get(&line).cloned();
        failure.map(|(status, body)| {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body).into_response()
        })
    }

    /// Binds to an ephemeral port and returns the base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/accounting/stats", get(stats))
            .route("/api/{collection}", get(list).post(create))
            .route(
                "/api/{collection}/{id}",
                get(show).patch(update).delete(remove),
            )
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}

async fn stats(State(backend): State<StubBackend>) -> Response {
    if let Some(failure) = backend.enter("GET", "/api/accounting/stats").await {
        return failure;
    }
    let fixed = backend.records("fixed-costs").len();
    let extra = backend.records("extra-costs").len();
    Json(json!({ "fixedCostCount": fixed, "extraCostCount": extra })).into_response()
}

async fn list(
    State(backend): State<StubBackend>,
    Path(collection): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
) -> Response {
    // Answer with what was stored when the request arrived, like a real query.
    let stored = backend.records(&collection);
    if let Some(failure) = backend.enter("GET", &format!("/api/{collection}")).await {
        return failure;
    }
    let records: Vec<Value> = stored
        .into_iter()
        .filter(|record| {
            filters
                .iter()
                .all(|(name, value)| record.get(name).and_then(Value::as_str) == Some(value.as_str()))
        })
        .collect();
    Json(records).into_response()
}

async fn show(
    State(backend): State<StubBackend>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    if let Some(failure) = backend.enter("GET", &format!("/api/{collection}/{id}")).await {
        return failure;
    }
    backend
        .records(&collection)
        .into_iter()
        .find(|record| record["id"] == id.as_str())
        .map(|record| Json(record).into_response())
        .unwrap_or_else(not_found)
}

async fn create(
    State(backend): State<StubBackend>,
    Path(collection): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    if let Some(failure) = backend.enter("POST", &format!("/api/{collection}")).await {
        return failure;
    }
    body["id"] = json!(Uuid::new_v4());
    backend
        .state
        .collections
        .lock()
        .unwrap()
        .entry(collection)
        .or_default()
        .push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update(
    State(backend): State<StubBackend>,
    Path((collection, id)): Path<(String, String)>,
    Json(patch): Json<Value>,
) -> Response {
    if let Some(failure) = backend.enter("PATCH", &format!("/api/{collection}/{id}")).await {
        return failure;
    }
    let mut collections = backend.state.collections.lock().unwrap();
    let Some(record) = collections
        .get_mut(&collection)
        .and_then(|records| records.iter_mut().find(|r| r["id"] == id.as_str()))
    else {
        return not_found();
    };
    if let (Some(target), Some(fields)) = (record.as_object_mut(), patch.as_object()) {
        for (name, value) in fields {
            target.insert(name.clone(), value.clone());
        }
    }
    Json(record.clone()).into_response()
}

async fn remove(
    State(backend): State<StubBackend>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    if let Some(failure) = backend.enter("DELETE", &format!("/api/{collection}/{id}")).await {
        return failure;
    }
    let mut collections = backend.state.collections.lock().unwrap();
    let Some(records) = collections.get_mut(&collection) else {
        return not_found();
    };
    let before = records.len();
    records.retain(|r| r["id"] != id.as_str());
    if records.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Remembers every toast along with whatever `probe` reported at that moment.
pub struct RecordingNotifier {
    probe: Box<dyn Fn() -> Option<bool> + Send + Sync>,
    seen: Mutex<Vec<(Toast, Option<bool>)>>,
}

impl RecordingNotifier {
    pub fn new(probe: impl Fn() -> Option<bool> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            probe: Box::new(probe),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn silent() -> Arc<Self> {
        Self::new(|| None)
    }

    pub fn seen(&self) -> Vec<(Toast, Option<bool>)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.seen().into_iter().map(|(toast, _)| toast).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        let observed = (self.probe)();
        self.seen.lock().unwrap().push((toast, observed));
    }
}

pub fn context(base_url: &str, cache: &QueryCache, notifier: Arc<dyn Notifier>) -> AppContext {
    AppContext::new(ApiClient::new(base_url).unwrap(), cache.clone(), notifier)
}

pub fn fixed_cost(name: &str, amount: &str, frequency: &str, location: Option<&str>) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "locationId": location,
        "name": name,
        "category": "rent",
        "amount": amount,
        "frequency": frequency,
    })
}
