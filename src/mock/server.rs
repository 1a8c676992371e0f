use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Mutex};

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn body_as_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    pub fn body_as_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Header names are stored lowercased.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Clone, Debug)]
pub struct MockRoute {
    path: String,
    responders: Vec<MockResponse>,
}

impl MockRoute {
    pub fn new(path: impl Into<String>, responders: Vec<MockResponse>) -> Self {
        Self {
            path: path.into(),
            responders,
        }
    }

    pub fn single(path: impl Into<String>, responder: MockResponse) -> Self {
        Self::new(path, vec![responder])
    }
}

#[derive(Clone, Debug)]
pub enum MockResponse {
    Json(MockJsonResponse),
    Text(MockTextResponse),
    Delayed(MockDelayedResponse),
}

impl MockResponse {
    pub fn health_ok() -> Self {
        MockResponse::Json(MockJsonResponse::new(serde_json::json!({ "status": "ok" })))
    }

    pub fn openai_chat_completion(reply: impl Into<String>) -> Self {
        MockResponse::Json(MockJsonResponse::new(serde_json::json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": reply.into(),
                    },
                    "finish_reason": "stop",
                }
            ],
        })))
    }

    pub fn gemini_model_list<D>(models: D) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
    {
        let models = models
            .into_iter()
            .map(|name| {
                serde_json::json!({
                    "name": format!("models/{}", name.into()),
                })
            })
            .collect::<Vec<_>>();

        MockResponse::Json(MockJsonResponse::new(serde_json::json!({ "models": models })))
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        MockResponse::Text(MockTextResponse {
            body: body.into(),
            status,
        })
    }

    /// Hold the connection open for `delay` before answering with `response`.
    pub fn delayed(delay: Duration, response: MockResponse) -> Self {
        MockResponse::Delayed(MockDelayedResponse {
            delay,
            response: Box::new(response),
        })
    }
}

#[derive(Clone, Debug)]
struct RouteState {
    responders: Vec<MockResponse>,
    call_count: usize,
}

impl RouteState {
    /// Responders are served in order; the last one repeats once exhausted.
    fn next(&mut self) -> Option<MockResponse> {
        if self.responders.is_empty() {
            return None;
        }

        let idx = self.call_count.min(self.responders.len() - 1);
        self.call_count += 1;
        Some(self.responders[idx].clone())
    }
}

struct MockServerState {
    routes: Mutex<HashMap<String, RouteState>>,
    recordings: Mutex<Vec<RecordedRequest>>,
}

impl MockServerState {
    async fn next_response(&self, path: &str) -> Option<MockResponse> {
        let route = path.split('?').next().unwrap_or(path);
        let mut routes = self.routes.lock().await;
        routes.get_mut(route).and_then(|route| route.next())
    }

    async fn record_request(&self, record: RecordedRequest) {
        let mut recordings = self.recordings.lock().await;
        recordings.push(record);
    }

    async fn recordings(&self) -> Vec<RecordedRequest> {
        let recordings = self.recordings.lock().await;
        recordings.clone()
    }
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockServerState>,
    shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    join_handle: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl MockServer {
    /// Bind an ephemeral loopback port and serve `routes` from a spawned task.
    ///
    /// Must be called from within a tokio runtime. Unknown paths get a plain
    /// `404 Not Found`.
    pub async fn start(routes: Vec<MockRoute>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockServerState {
            routes: Mutex::new(HashMap::new()),
            recordings: Mutex::new(Vec::new()),
        });

        {
            let mut map = state.routes.lock().await;
            for route in routes {
                map.insert(
                    route.path,
                    RouteState {
                        responders: route.responders,
                        call_count: 0,
                    },
                );
            }
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let state_clone = state.clone();
        let join_handle = tokio::spawn(async move {
            run_server(listener, state_clone, shutdown_rx).await;
        });

        Ok(Self {
            addr,
            state,
            shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
            join_handle: Arc::new(Mutex::new(Some(join_handle))),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.join_handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.state.recordings().await
    }

    pub async fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .recordings()
            .await
            .into_iter()
            .filter(|record| record.path == path)
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Ok(mut tx_opt) = self.shutdown_tx.try_lock() {
            if let Some(tx) = tx_opt.take() {
                let _ = tx.send(());
            }
        }

        if let Ok(mut handle_opt) = self.join_handle.try_lock() {
            if let Some(handle) = handle_opt.take() {
                handle.abort();
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockJsonResponse {
    body: serde_json::Value,
    status: u16,
}

impl MockJsonResponse {
    pub fn new(body: serde_json::Value) -> Self {
        Self { body, status: 200 }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

#[derive(Clone, Debug)]
pub struct MockTextResponse {
    body: String,
    status: u16,
}

#[derive(Clone, Debug)]
pub struct MockDelayedResponse {
    delay: Duration,
    response: Box<MockResponse>,
}

async fn run_server(
    listener: TcpListener,
    state: Arc<MockServerState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                break;
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _)) => {
                        let state_clone = state.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, state_clone).await {
                                tracing::debug!(error = %err, "mock server connection error");
                            }
                        });
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "mock server accept error");
                        break;
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    state: Arc<MockServerState>,
) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut temp = [0u8; 1024];
    let mut head: Option<(usize, ParsedHead)> = None;

    loop {
        let n = stream.read(&mut temp).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&temp[..n]);

        if head.is_none() {
            if let Some(end) = find_header_end(&buffer) {
                head = Some((end, parse_request_head(&buffer[..end])));
            }
        }

        if let Some((end, parsed)) = &head {
            if buffer.len() >= end + parsed.content_length {
                break;
            }
        }
    }

    let Some((header_end, head)) = head else {
        return Ok(());
    };

    let body = if buffer.len() >= header_end + head.content_length {
        buffer[header_end..header_end + head.content_length].to_vec()
    } else {
        Vec::new()
    };

    let path = head.path.clone();
    state
        .record_request(RecordedRequest {
            method: head.method,
            path: head.path,
            headers: head.headers,
            body,
        })
        .await;

    let mut response = state.next_response(&path).await;
    loop {
        return match response {
            Some(MockResponse::Delayed(delayed)) => {
                tokio::time::sleep(delayed.delay).await;
                response = Some(*delayed.response);
                continue;
            }
            Some(MockResponse::Json(json)) => {
                let body = json.body.to_string();
                send_response(&mut stream, json.status, "application/json", &body).await
            }
            Some(MockResponse::Text(text)) => {
                send_response(&mut stream, text.status, "text/plain", &text.body).await
            }
            None => send_response(&mut stream, 404, "text/plain", "Not Found").await,
        };
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|idx| idx + 4)
}

struct ParsedHead {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    content_length: usize,
}

fn parse_request_head(buffer: &[u8]) -> ParsedHead {
    let head = String::from_utf8_lossy(buffer);
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    let mut headers = HashMap::new();
    let mut content_length = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let key = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if key == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.insert(key, value);
        }
    }

    ParsedHead {
        method,
        path,
        headers,
        content_length,
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

async fn send_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &str,
) -> std::io::Result<()> {
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason_phrase(status),
        content_type,
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(body.as_bytes()).await?;
    stream.shutdown().await
}
