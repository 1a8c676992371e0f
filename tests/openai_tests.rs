mod common;

use common::{
    client, config_for, header, request_body_json, run_to_string, runtime, start_server,
    unreachable_config,
};
use endpoint_smoke::api::Check;
use endpoint_smoke::config::SmokeConfig;
use endpoint_smoke::mock::{MockJsonResponse, MockResponse, MockRoute};
use endpoint_smoke::openai::ChatCompletionCheck;
use endpoint_smoke::runner::Runner;
use endpoint_smoke::CheckError;

fn expected_body(model: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            { "role": "system", "content": "You are a helpful assistant." },
            { "role": "user", "content": "Hello!" },
        ]
    })
}

#[test]
fn chat_build_request_has_headers_and_two_messages() {
    let config = SmokeConfig::default();
    let request = ChatCompletionCheck::new(&config)
        .build_request(&client(&config))
        .build()
        .expect("chat request should build");

    assert_eq!(request.method(), reqwest::Method::POST);
    assert_eq!(
        request.url().as_str(),
        "http://localhost:8888/v1/chat/completions"
    );
    assert_eq!(header(&request, "content-type"), Some("application/json"));
    assert_eq!(header(&request, "authorization"), Some("Bearer clara4014@"));
    assert_eq!(
        request.headers().get_all("content-type").iter().count(),
        1
    );

    assert_eq!(
        request_body_json(&request),
        expected_body("gemini-2.5-pro-preview-05-06")
    );
}

#[test]
fn chat_success_sends_expected_payload() {
    let runtime = runtime();
    let server = start_server(
        &runtime,
        vec![MockRoute::single(
            "/v1/chat/completions",
            MockResponse::openai_chat_completion("mock reply"),
        )],
    );
    let config = config_for(&server).with_api_key("mock-key").with_model("mock-model");

    let success = ChatCompletionCheck::new(&config)
        .run(&client(&config))
        .expect("chat check succeeds");

    assert_eq!(success.status, 200);
    assert_eq!(
        success.body["choices"][0]["message"]["content"],
        "mock reply"
    );

    let recorded = runtime.block_on(server.requests_for("/v1/chat/completions"));
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method, "POST");
    assert_eq!(recorded[0].header("Content-Type"), Some("application/json"));
    assert_eq!(recorded[0].header("Authorization"), Some("Bearer mock-key"));
    assert_eq!(
        recorded[0].body_as_json().expect("request body is json"),
        expected_body("mock-model")
    );

    runtime.block_on(server.shutdown());
}

#[test]
fn chat_error_status_prints_raw_response_text() {
    let runtime = runtime();
    let server = start_server(
        &runtime,
        vec![MockRoute::single(
            "/v1/chat/completions",
            MockResponse::text(500, "upstream model overloaded"),
        )],
    );
    let config = config_for(&server);
    let runner = Runner::with_checks(
        client(&config),
        vec![Box::new(ChatCompletionCheck::new(&config))],
    );

    let (output, reports) = run_to_string(&runner);

    let err = reports[0].outcome.as_ref().expect_err("500 is a failure");
    assert!(matches!(err, CheckError::Status { .. }));
    assert_eq!(err.response_text(), Some("upstream model overloaded"));

    assert!(output.contains("OpenAI API Test failed: 500 Server Error: Internal Server Error"));
    assert!(output.contains("Response content: upstream model overloaded\n"));

    runtime.block_on(server.shutdown());
}

#[test]
fn chat_json_error_body_is_echoed_verbatim() {
    let runtime = runtime();
    let server = start_server(
        &runtime,
        vec![MockRoute::single(
            "/v1/chat/completions",
            MockResponse::Json(
                MockJsonResponse::new(serde_json::json!({ "error": "invalid api key" }))
                    .with_status(401),
            ),
        )],
    );
    let config = config_for(&server);
    let runner = Runner::with_checks(
        client(&config),
        vec![Box::new(ChatCompletionCheck::new(&config))],
    );

    let (output, _) = run_to_string(&runner);

    assert!(output.contains("OpenAI API Test failed: 401 Client Error: Unauthorized"));
    assert!(output.contains("Response content: {\"error\":\"invalid api key\"}\n"));

    runtime.block_on(server.shutdown());
}

#[test]
fn chat_non_json_success_body_is_echoed() {
    let runtime = runtime();
    let server = start_server(
        &runtime,
        vec![MockRoute::single(
            "/v1/chat/completions",
            MockResponse::text(200, "<html>oops</html>"),
        )],
    );
    let config = config_for(&server);
    let runner = Runner::with_checks(
        client(&config),
        vec![Box::new(ChatCompletionCheck::new(&config))],
    );

    let (output, reports) = run_to_string(&runner);

    let err = reports[0].outcome.as_ref().expect_err("html is not JSON");
    assert!(matches!(err, CheckError::Decode { .. }));
    assert_eq!(err.status().map(|status| status.as_u16()), Some(200));

    assert!(output.contains("OpenAI API Test failed: status 200 response body is not valid JSON"));
    assert!(output.contains("Response content: <html>oops</html>\n"));

    runtime.block_on(server.shutdown());
}

#[test]
fn chat_unreachable_host_has_no_response_text() {
    let config = unreachable_config();

    let err = ChatCompletionCheck::new(&config)
        .run(&client(&config))
        .expect_err("nothing is listening");

    assert!(err.is_connect());
    assert!(err.response_text().is_none());
    assert!(err.status().is_none());
}
