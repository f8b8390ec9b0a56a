//! E2E tests: code execution proxy, assistant helpers and health.

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_execute_relays_result_record() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::post()
        .uri("/execute")
        .set_json(json!({ "language": "javascript", "code": "echo", "stdin": "ping" }))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stdout"], "ping");
    assert_eq!(body["status"]["id"], 3);
    assert_eq!(body["status"]["description"], "Accepted");
    assert_eq!(body["time"], "0.012");
    assert_eq!(body["memory"], 3200);
    assert_eq!(body["language_id"], 71);
    assert_eq!(body["wall_time"], "0.051");
    assert!(body.as_object().unwrap().contains_key("exit_signal"));
    assert!(body["token"].as_str().is_some_and(|t| t.starts_with("token-")));
}

#[actix_rt::test]
async fn test_execute_relays_failed_runs_as_ok() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::post()
        .uri("/execute")
        .set_json(json!({ "language": "cpp", "code": "compile-error" }))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["id"], 6);
    assert_eq!(body["compile_output"], "SyntaxError: invalid syntax");
    assert_eq!(env.judge0.stdins(), vec![""]);
}

#[actix_rt::test]
async fn test_execute_validation() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::post()
        .uri("/execute")
        .set_json(json!({ "language": "python" }))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Language and code are required.");

    let req = test::TestRequest::post()
        .uri("/execute")
        .set_json(json!({ "language": "brainfuck", "code": "+" }))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Language 'brainfuck' is not supported.");
}

#[actix_rt::test]
async fn test_execute_polling_is_bounded() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::post()
        .uri("/execute")
        .set_json(json!({ "language": "java", "code": "forever" }))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "EXECUTION_TIMEOUT");
}

#[actix_rt::test]
async fn test_execute_missing_token_is_server_error() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::post()
        .uri("/execute")
        .set_json(json!({ "language": "python", "code": "no-token" }))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to get submission token.");
}

#[actix_rt::test]
async fn test_assistant_endpoints() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    let user = signup(&app, "alice").await;

    let req = test::TestRequest::post()
        .uri("/api/assistant/explain-error")
        .insert_header(bearer(&user.token))
        .set_json(json!({ "language": "python", "code": "print(x)", "error": "NameError" }))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["response"].as_str().unwrap().starts_with("Echo: "));
    let prompt = env.llm.last_prompt().unwrap();
    assert!(prompt.contains("```python\nprint(x)\n```"));
    assert!(prompt.contains("NameError"));

    let req = test::TestRequest::post()
        .uri("/api/assistant/ask")
        .insert_header(bearer(&user.token))
        .set_json(json!({
            "language": "python",
            "code": "xs = [1, 2]\nprint(xs[0])",
            "selection": "xs[0]",
            "question": "Why zero?",
        }))
        .to_request();
    let (status, _) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(env.llm.last_prompt().unwrap().contains("Why zero?"));

    let req = test::TestRequest::post()
        .uri("/api/assistant/ask")
        .insert_header(bearer(&user.token))
        .set_json(json!({ "language": "python", "code": "x" }))
        .to_request();
    let (status, _) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/assistant/explain-error")
        .set_json(json!({ "language": "python", "code": "x", "error": "e" }))
        .to_request();
    let (status, _) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_llm_requests_carry_api_key_header() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    let user = signup(&app, "bob").await;

    let req = test::TestRequest::post()
        .uri("/api/assistant/explain-error")
        .insert_header(bearer(&user.token))
        .set_json(json!({ "language": "python", "code": "x", "error": "e" }))
        .to_request();
    call_json(&app, req).await;

    let keys = env.llm.state.lock().unwrap().api_keys.clone();
    assert_eq!(keys, vec![Some(TEST_GEMINI_KEY.to_string())]);
}

#[actix_rt::test]
async fn test_health_and_ready() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let req = test::TestRequest::get().uri("/api/ready").to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
    assert_eq!(body["execution"], "configured");
    assert_eq!(body["assistant"], "configured");
    assert_eq!(body["googleLogin"], "unconfigured");
}

#[actix_rt::test]
async fn test_ready_reports_missing_collaborator_keys() {
    let mut env = TestEnv::start().await;
    env.config.judge0.api_key = None;
    env.config.llm.api_key = None;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::get().uri("/api/ready").to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["execution"], "unconfigured");
    assert_eq!(body["assistant"], "unconfigured");
}
