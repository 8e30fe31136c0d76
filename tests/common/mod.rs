#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use question2answer::config::Config;
use question2answer::server::{build_router, AppState};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// What the stub completion endpoint answers with.
#[derive(Clone)]
pub enum StubReply {
    Json(serde_json::Value),
    Status(StatusCode, String),
    Raw(String),
}

/// A stand-in for the chat completions endpoint that counts calls and records the
/// request bodies and Authorization headers it receives.
pub struct CompletionStub {
    base_url: String,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

#[derive(Clone)]
struct StubState {
    reply: StubReply,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
}

impl CompletionStub {
    pub async fn start(reply: StubReply) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let auth = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(StubState {
            reply,
            calls: calls.clone(),
            requests: requests.clone(),
            auth: auth.clone(),
        });

        let router = Router::new()
            .route("/openai/v1/chat/completions", post(completions_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub completion endpoint");
        let addr = listener.local_addr().expect("stub local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service());
        tokio::spawn(async move {
            tokio::select! {
                res = server => {
                    if let Err(err) = res {
                        eprintln!("Stub completion server error: {err:?}");
                    }
                }
                _ = rx => {}
            }
        });

        CompletionStub {
            base_url: format!("http://{}", addr),
            calls,
            requests,
            auth,
            shutdown: Some(tx),
        }
    }

    /// Full completion URL to hand to `Config::completions_url`.
    pub fn url(&self) -> String {
        format!("{}/openai/v1/chat/completions", self.base_url)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn take_requests(&self) -> Vec<serde_json::Value> {
        let mut guard = self.requests.lock().expect("lock stub requests");
        guard.drain(..).collect()
    }

    pub fn take_auth_headers(&self) -> Vec<Option<String>> {
        let mut guard = self.auth.lock().expect("lock stub auth");
        guard.drain(..).collect()
    }
}

impl Drop for CompletionStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn completions_handler(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Ok(mut guard) = state.requests.lock() {
            guard.push(v);
        }
    }
    if let Ok(mut guard) = state.auth.lock() {
        guard.push(
            headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
    }

    match &state.reply {
        StubReply::Json(v) => axum::Json(v.clone()).into_response(),
        StubReply::Status(status, body) => (*status, body.clone()).into_response(),
        StubReply::Raw(text) => text.clone().into_response(),
    }
}

/// A completion body whose forced tool call carries `arguments` verbatim.
pub fn tool_call_completion(arguments: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-stub",
        "object": "chat.completion",
        "created": 1_700_000_000u64,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_stub",
                    "type": "function",
                    "function": {"name": "get_answer", "arguments": arguments}
                }]
            },
            "finish_reason": "stop"
        }]
    })
}

/// Zip `entries` in memory, in the given order.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut w = zip::ZipWriter::new(&mut buf);
        let opts = zip::write::SimpleFileOptions::default();
        for (name, body) in entries {
            w.start_file(*name, opts).expect("start zip entry");
            w.write_all(body.as_bytes()).expect("write zip entry");
        }
        w.finish().expect("finish zip");
    }
    buf.into_inner()
}

/// The real router bound to an ephemeral port and pointed at a `CompletionStub`.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    pub scratch: tempfile::TempDir,
    join: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn post_question(
        &self,
        question: Option<&str>,
        file: Option<(&str, Vec<u8>)>,
    ) -> reqwest::Response {
        let mut form = reqwest::multipart::Form::new();
        if let Some(q) = question {
            form = form.text("question", q.to_string());
        }
        if let Some((name, bytes)) = file {
            form = form.part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(name.to_string()),
            );
        }
        self.client
            .post(format!("{}/api/", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("request to test server")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("request to test server")
    }

    /// Whether every per-request scratch directory has been removed.
    pub fn scratch_is_empty(&self) -> bool {
        match std::fs::read_dir(self.scratch.path()) {
            Ok(mut it) => it.next().is_none(),
            Err(_) => true,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Spawn the application router on an ephemeral port, talking to `stub`.
pub async fn spawn_app(stub: &CompletionStub, accept_bare_csv: bool) -> TestServer {
    let scratch = tempfile::tempdir().expect("scratch dir");
    let config = Config {
        api_token: Some("test-token".into()),
        completions_url: stub.url(),
        http_timeout: Some(Duration::from_secs(10)),
        scratch_dir: scratch.path().to_path_buf(),
        accept_bare_csv,
        ..Config::default()
    };
    let state = AppState::from_config(&config).expect("app state");
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let server = axum::serve(listener, app.into_make_service());
    let join = tokio::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("Test server error: {e:?}");
        }
    });

    TestServer {
        base_url: format!("http://{}", addr),
        addr,
        scratch,
        join,
        client: reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed building reqwest client"),
    }
}
