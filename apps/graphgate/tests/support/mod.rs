//! Shared fixtures: an in-process SPARQL 1.1 store, an in-process broker
//! management API and a recording provenance publisher.

#![allow(dead_code, clippy::unwrap_used, clippy::panic)]

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use graphgate::config::GatewayConfig;
use graphgate::materialize::Materializer;
use graphgate::pipeline::Pipeline;
use graphgate::publish::ProvenancePublisher;
use graphgate::source::SourceResolver;
use graphgate::store::GraphStoreClient;
use graphgate_core::{GatewayError, OperationRequest, ProvenanceMessage};
use serde_json::{Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// FAKE TRIPLE STORE
// =============================================================================

/// One request as the fake store saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn params_named(&self, name: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_write(&self) -> bool {
        self.path.ends_with("/data") && (self.method == Method::POST || self.method == Method::PUT)
    }
}

#[derive(Default)]
struct StoreState {
    requests: Vec<Recorded>,
    /// Graph URI -> N-Triples lines.
    graphs: BTreeMap<String, Vec<String>>,
    /// Writes with an index at or above this answer 500.
    fail_writes_from: Option<usize>,
    writes_seen: usize,
    query_response: String,
}

type SharedStore = Arc<Mutex<StoreState>>;

/// A SPARQL 1.1 store serving dataset `ds` on an ephemeral port.
pub struct FakeStore {
    pub addr: SocketAddr,
    state: SharedStore,
}

impl FakeStore {
    pub async fn spawn() -> Self {
        let state = SharedStore::default();
        let app = Router::new()
            .fallback(store_handler)
            .with_state(Arc::clone(&state));
        let addr = serve(app).await;
        Self { addr, state }
    }

    /// Seed a graph with N-Triples statements, one per line.
    pub fn insert_graph(&self, uri: &str, lines: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state
            .graphs
            .insert(uri.to_string(), lines.iter().map(|l| (*l).to_string()).collect());
    }

    pub fn graph(&self, uri: &str) -> Option<Vec<String>> {
        self.state.lock().unwrap().graphs.get(uri).cloned()
    }

    pub fn set_query_response(&self, body: &str) {
        self.state.lock().unwrap().query_response = body.to_string();
    }

    /// Make the `index`-th write (0-based) and every later one fail.
    pub fn fail_writes_from(&self, index: usize) {
        self.state.lock().unwrap().fail_writes_from = Some(index);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn writes(&self) -> Vec<Recorded> {
        self.requests().into_iter().filter(Recorded::is_write).collect()
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn parse_params(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn text(status: StatusCode, content_type: &str, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, content_type.to_string())], body).into_response()
}

async fn store_handler(
    State(state): State<SharedStore>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let recorded = Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        params: parse_params(uri.query()),
        headers,
        body,
    };
    let mut state = state.lock().unwrap();
    state.requests.push(recorded.clone());

    match (method.as_str(), recorded.path.as_str()) {
        ("GET", "/$/ping") => text(StatusCode::OK, "text/plain", "pong".to_string()),
        ("GET", "/$/stats/ds") => {
            let stats = json!({"datasets": {"/ds": {
                "Requests": 12, "RequestsGood": 10, "RequestsBad": 2, "endpoints": {}
            }}});
            text(StatusCode::OK, "application/json", stats.to_string())
        }
        ("GET", "/ds/sparql") => {
            let bindings: Vec<Value> = state
                .graphs
                .iter()
                .map(|(g, lines)| {
                    json!({
                        "g": {"type": "uri", "value": g},
                        "count": {
                            "type": "literal",
                            "datatype": "http://www.w3.org/2001/XMLSchema#integer",
                            "value": lines.len().to_string()
                        }
                    })
                })
                .collect();
            let body = json!({"head": {"vars": ["g", "count"]}, "results": {"bindings": bindings}});
            text(StatusCode::OK, "application/sparql-results+json", body.to_string())
        }
        ("GET", "/ds/query") => {
            let accept = recorded.header("accept").unwrap_or("text/plain").to_string();
            text(StatusCode::OK, &accept, state.query_response.clone())
        }
        ("GET", "/ds/data") => {
            let graph = recorded.param("graph").unwrap_or_default();
            match state.graphs.get(graph) {
                Some(lines) => text(StatusCode::OK, "text/turtle", lines.join("\n")),
                None => text(StatusCode::NOT_FOUND, "text/plain", "Not Found".to_string()),
            }
        }
        (verb @ ("POST" | "PUT"), "/ds/data") => {
            let index = state.writes_seen;
            state.writes_seen += 1;
            if state.fail_writes_from.is_some_and(|from| index >= from) {
                return text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain",
                    "write refused".to_string(),
                );
            }
            let graph = recorded.param("graph").unwrap_or_default().to_string();
            let lines: Vec<String> = recorded
                .body
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect();
            let count = lines.len();
            let entry = state.graphs.entry(graph).or_default();
            if verb == "PUT" {
                entry.clear();
            }
            entry.extend(lines);
            let summary = json!({"count": count, "tripleCount": count, "quadCount": 0});
            text(StatusCode::OK, "application/json", summary.to_string())
        }
        ("POST", "/ds/update") => {
            let form = parse_params(Some(&recorded.body));
            let update = form
                .iter()
                .find(|(k, _)| k == "update")
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            if let Some(graph) = update
                .strip_prefix("DROP SILENT GRAPH <")
                .and_then(|rest| rest.strip_suffix('>'))
            {
                state.graphs.remove(graph);
                text(StatusCode::OK, "text/plain", String::new())
            } else {
                text(StatusCode::BAD_REQUEST, "text/plain", "bad update".to_string())
            }
        }
        _ => text(StatusCode::NOT_FOUND, "text/plain", "Not Found".to_string()),
    }
}

// =============================================================================
// FAKE BROKER (management HTTP API)
// =============================================================================

/// One message published through the management API.
#[derive(Debug, Clone)]
pub struct Published {
    pub routing_key: String,
    pub properties: Value,
    pub payload: Value,
}

#[derive(Default)]
struct BrokerState {
    pending: VecDeque<Value>,
    published: Vec<Published>,
    unroutable: bool,
    get_delay: Duration,
}

type SharedBroker = Arc<Mutex<BrokerState>>;

pub struct FakeBroker {
    pub addr: SocketAddr,
    state: SharedBroker,
}

impl FakeBroker {
    pub async fn spawn() -> Self {
        let state = SharedBroker::default();
        let app = Router::new()
            .fallback(broker_handler)
            .with_state(Arc::clone(&state));
        let addr = serve(app).await;
        Self { addr, state }
    }

    /// Queue a message for the next `get`.
    pub fn enqueue(&self, payload: &str, reply_to: Option<&str>, correlation_id: Option<&str>) {
        let mut properties = serde_json::Map::new();
        if let Some(queue) = reply_to {
            properties.insert("reply_to".to_string(), json!(queue));
        }
        if let Some(id) = correlation_id {
            properties.insert("correlation_id".to_string(), json!(id));
        }
        let properties = if properties.is_empty() {
            json!([])
        } else {
            Value::Object(properties)
        };
        self.state.lock().unwrap().pending.push_back(json!({
            "payload_bytes": payload.len(),
            "redelivered": false,
            "exchange": "",
            "routing_key": "graphmanager.rpc",
            "message_count": 0,
            "properties": properties,
            "payload": payload,
            "payload_encoding": "string"
        }));
    }

    /// Hold every `get` answer back for `delay` after the message is taken.
    pub fn set_get_delay(&self, delay: Duration) {
        self.state.lock().unwrap().get_delay = delay;
    }

    pub fn set_unroutable(&self, unroutable: bool) {
        self.state.lock().unwrap().unroutable = unroutable;
    }

    pub fn published(&self) -> Vec<Published> {
        self.state.lock().unwrap().published.clone()
    }
}

async fn broker_handler(State(state): State<SharedBroker>, uri: Uri, body: String) -> Response {
    let path = uri.path();

    if path.starts_with("/api/queues/%2F/") && path.ends_with("/get") {
        let (messages, delay) = {
            let mut state = state.lock().unwrap();
            let taken: Vec<Value> = state.pending.pop_front().into_iter().collect();
            (taken, state.get_delay)
        };
        tokio::time::sleep(delay).await;
        return text(StatusCode::OK, "application/json", Value::Array(messages).to_string());
    }

    let mut state = state.lock().unwrap();
    if path == "/api/exchanges/%2F/amq.default/publish" {
        if state.unroutable {
            return text(StatusCode::OK, "application/json", json!({"routed": false}).to_string());
        }
        let request: Value = serde_json::from_str(&body).unwrap();
        let payload = request["payload"].as_str().unwrap();
        state.published.push(Published {
            routing_key: request["routing_key"].as_str().unwrap().to_string(),
            properties: request["properties"].clone(),
            payload: serde_json::from_str(payload).unwrap(),
        });
        return text(StatusCode::OK, "application/json", json!({"routed": true}).to_string());
    }
    text(StatusCode::NOT_FOUND, "application/json", json!({"error": "Object Not Found"}).to_string())
}

// =============================================================================
// LOG CAPTURE
// =============================================================================

/// Formatted log output of the current thread, collected while the guard from
/// [`LogCapture::install`] lives.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// =============================================================================
// RECORDING PUBLISHER
// =============================================================================

/// Keeps every published provenance message; can be switched to fail.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    messages: Arc<Mutex<Vec<ProvenanceMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingPublisher {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<ProvenanceMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProvenancePublisher for RecordingPublisher {
    async fn publish(&self, message: &ProvenanceMessage) -> Result<(), GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::PublishFailure {
                reason: "broker down".to_string(),
                underlying: None,
            });
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// =============================================================================
// WIRING
// =============================================================================

/// Configuration pointing at `store`, `broker` and `results_dir`.
pub fn config(store: SocketAddr, broker: Option<SocketAddr>, results_dir: &Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.store.host = store.ip().to_string();
    config.store.port = store.port();
    config.output.results_dir = results_dir.to_path_buf();
    config.timeouts.read_secs = 5;
    if let Some(broker) = broker {
        config.broker.host = broker.ip().to_string();
        config.broker.management_port = broker.port();
    }
    config
}

pub fn store_client(config: &GatewayConfig) -> GraphStoreClient {
    GraphStoreClient::new(&config.store, &config.timeouts).unwrap()
}

pub fn pipeline(config: &GatewayConfig, publisher: RecordingPublisher) -> Pipeline<RecordingPublisher> {
    Pipeline::new(
        store_client(config),
        SourceResolver::new(&config.timeouts).unwrap(),
        Materializer::new(&config.output),
        publisher,
    )
}

// =============================================================================
// REQUEST MESSAGES
// =============================================================================

pub fn context() -> Value {
    json!({"activityID": "act-1", "workflowID": "wf-1", "stepID": "step-1"})
}

pub fn message(input: Value) -> Value {
    json!({
        "provenance": {"context": context()},
        "payload": {"graphManagerInput": input}
    })
}

pub fn request(input: Value) -> OperationRequest {
    OperationRequest::from_value(message(input)).unwrap()
}
