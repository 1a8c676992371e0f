#![allow(dead_code)]

use endpoint_smoke::config::SmokeConfig;
use endpoint_smoke::mock::{MockRoute, MockServer};
use endpoint_smoke::runner::{CheckReport, Runner};
use tokio::runtime::Runtime;

/// The mock server runs on this runtime's worker threads while the blocking
/// checks run on the test thread.
pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("tokio runtime for mock server")
}

pub fn start_server(runtime: &Runtime, routes: Vec<MockRoute>) -> MockServer {
    runtime
        .block_on(MockServer::start(routes))
        .expect("mock server starts")
}

pub fn config_for(server: &MockServer) -> SmokeConfig {
    SmokeConfig::for_mock_server(server).expect("config for mock server")
}

/// A loopback address nothing is listening on.
pub fn unreachable_config() -> SmokeConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    SmokeConfig::from_base_url(format!("http://127.0.0.1:{}", port)).expect("loopback config")
}

pub fn client(config: &SmokeConfig) -> reqwest::blocking::Client {
    endpoint_smoke::build_client(config).expect("blocking client")
}

pub fn run_to_string(runner: &Runner) -> (String, Vec<CheckReport>) {
    let mut out = Vec::new();
    let reports = runner.run(&mut out).expect("report is written");
    (String::from_utf8(out).expect("report is utf-8"), reports)
}

pub fn request_body_json(request: &reqwest::blocking::Request) -> serde_json::Value {
    let bytes = request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("request body should be JSON bytes");

    serde_json::from_slice(bytes).expect("request body should deserialize")
}

pub fn header<'a>(request: &'a reqwest::blocking::Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .map(|value| value.to_str().expect("header is ascii"))
}
