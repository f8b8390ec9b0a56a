//! Shared test helpers for API E2E tests.

use actix_web::http::StatusCode;
use actix_web::{App, dev::ServiceResponse, test, web};
use codementor_lib::auth::TokenIssuer;
use codementor_lib::config::Config;
use codementor_lib::db::DbPool;
use codementor_lib::services::{CodeExecutor, CompletionProvider, GeminiClient, Judge0Client};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use super::mock_judge0::MockJudge0;
use super::mock_llm::MockLlm;

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "password123";

/// API keys the test configuration hands to the collaborators.
pub const TEST_RAPIDAPI_KEY: &str = "test-rapidapi-key";
pub const TEST_GEMINI_KEY: &str = "test-gemini-key";

/// Everything one test needs: a fresh database, both mocks and the
/// configuration pointing at them.
pub struct TestEnv {
    pub pool: DbPool,
    pub config: Config,
    pub judge0: MockJudge0,
    pub llm: MockLlm,
    _db_dir: TempDir,
}

impl TestEnv {
    /// Start the mocks and migrate a new SQLite database.
    pub async fn start() -> Self {
        let judge0 = MockJudge0::start().await;
        let llm = MockLlm::start().await;

        let db_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            db_dir.path().join("codementor.db").display()
        );

        let mut config = Config::development(&url);
        config.judge0.base_url = judge0.base_url.clone();
        config.judge0.api_key = Some(SecretString::from(TEST_RAPIDAPI_KEY.to_string()));
        config.judge0.poll_interval = Duration::from_millis(10);
        config.judge0.max_polls = 5;
        config.llm.base_url = llm.base_url.clone();
        config.llm.api_key = Some(SecretString::from(TEST_GEMINI_KEY.to_string()));
        config.llm.retry_base_delay = Duration::from_millis(10);

        let pool = DbPool::new(&config)
            .await
            .expect("Failed to connect to database");
        pool.run_migrations()
            .await
            .expect("Failed to run migrations");

        TestEnv {
            pool,
            config,
            judge0,
            llm,
            _db_dir: db_dir,
        }
    }

    pub fn issuer(&self) -> TokenIssuer {
        TokenIssuer::new(&self.config.auth)
    }
}

/// Create the full application wired to the test environment.
pub async fn create_test_app(
    env: &TestEnv,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let executor: Arc<dyn CodeExecutor> =
        Arc::new(Judge0Client::new(&env.config.judge0).expect("Failed to build Judge0 client"));
    let llm: Arc<dyn CompletionProvider> =
        Arc::new(GeminiClient::new(&env.config.llm).expect("Failed to build LLM client"));

    test::init_service(
        App::new()
            .app_data(web::Data::new(env.pool.clone()))
            .app_data(web::Data::new(env.config.clone()))
            .app_data(web::Data::new(env.issuer()))
            .app_data(web::Data::from(executor))
            .app_data(web::Data::from(llm))
            .app_data(codementor_lib::api::json_config())
            .configure(codementor_lib::api::configure_routes),
    )
    .await
}

/// Send a request and return status and JSON body (`Null` for empty bodies).
pub async fn call_json<S>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

/// `Authorization` header for a bearer token.
pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// A signed-up account.
pub struct TestUser {
    pub id: String,
    pub token: String,
}

/// Sign up `username` with `<username>@example.com`.
pub async fn signup<S>(app: &S, username: &str) -> TestUser
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": TEST_PASSWORD,
        }))
        .to_request();

    let (status, body) = call_json(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "Signup failed: {}", body);

    TestUser {
        id: body["user"]["id"].as_str().expect("user id").to_string(),
        token: body["token"].as_str().expect("token").to_string(),
    }
}

/// Submit `code` (python) for `title` against the given cases.
pub async fn submit<S>(
    app: &S,
    token: &str,
    title: &str,
    difficulty: &str,
    code: &str,
    test_cases: Value,
) -> (StatusCode, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/contest/submit")
        .insert_header(bearer(token))
        .set_json(serde_json::json!({
            "problemTitle": title,
            "problemDescription": "Echo the input.",
            "difficulty": difficulty,
            "topic": "Strings",
            "language": "python",
            "code": code,
            "testCases": test_cases,
        }))
        .to_request();

    call_json(app, req).await
}

/// Test cases that `echo` code passes.
pub fn passing_cases() -> Value {
    serde_json::json!([
        { "input": "a", "expectedOutput": "a", "isHidden": false }
    ])
}

/// Test cases that `echo` code fails.
pub fn failing_cases() -> Value {
    serde_json::json!([
        { "input": "a", "expectedOutput": "b", "isHidden": false }
    ])
}
