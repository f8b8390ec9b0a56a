//! Mock Judge0 server for E2E tests.
//!
//! The submitted `source_code` selects the behaviour:
//! - `echo`: prints stdin back
//! - `upper`: prints stdin in upper case
//! - `compile-error`: fails with a compilation error
//! - `crash`: fails with a runtime error on stderr
//! - `forever`: stays in "Processing" on every poll
//! - `no-token`: the submission reply carries no token
//!
//! Every submission is reported "In Queue" on its first poll so the client's
//! polling loop is exercised.

use actix_web::{App, HttpResponse, HttpServer, get, post, web};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Job {
    code: String,
    stdin: String,
    polls: u32,
}

/// Shared state for the mock server.
#[derive(Default)]
pub struct MockJudge0State {
    jobs: HashMap<String, Job>,
    /// Stdin of every submission, in arrival order
    pub stdins: Vec<String>,
    /// `X-RapidAPI-Key` header of every submission
    pub api_keys: Vec<Option<String>>,
}

#[derive(Deserialize)]
struct SubmissionBody {
    source_code: String,
    #[allow(dead_code)]
    language_id: u32,
    #[serde(default)]
    stdin: String,
}

#[post("/submissions")]
async fn create_submission(
    req: actix_web::HttpRequest,
    state: web::Data<Arc<Mutex<MockJudge0State>>>,
    body: web::Json<SubmissionBody>,
) -> HttpResponse {
    let mut state = state.lock().unwrap();
    state.stdins.push(body.stdin.clone());
    state.api_keys.push(
        req.headers()
            .get("X-RapidAPI-Key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    if body.source_code == "no-token" {
        return HttpResponse::Created().json(json!({}));
    }

    let token = format!("token-{}", state.jobs.len() + 1);
    state.jobs.insert(
        token.clone(),
        Job {
            code: body.source_code.clone(),
            stdin: body.stdin.clone(),
            polls: 0,
        },
    );
    HttpResponse::Created().json(json!({ "token": token }))
}

fn status(id: i32, description: &str) -> Value {
    json!({ "id": id, "description": description })
}

fn finished(token: &str, job: &Job) -> Value {
    let mut result = json!({
        "token": token,
        "stdout": null,
        "stderr": null,
        "compile_output": null,
        "message": null,
        "time": "0.012",
        "memory": 3200,
        "exit_code": 0,
        "language_id": 71,
        "wall_time": "0.051",
        "exit_signal": null,
    });
    match job.code.as_str() {
        "echo" => {
            result["stdout"] = json!(job.stdin);
            result["status"] = status(3, "Accepted");
        }
        "upper" => {
            result["stdout"] = json!(job.stdin.to_uppercase());
            result["status"] = status(3, "Accepted");
        }
        "compile-error" => {
            result["compile_output"] = json!("SyntaxError: invalid syntax");
            result["status"] = status(6, "Compilation Error");
            result["exit_code"] = json!(1);
        }
        "crash" => {
            result["stderr"] = json!("Traceback: boom");
            result["status"] = status(11, "Runtime Error (NZEC)");
            result["exit_code"] = json!(1);
        }
        _ => {
            result["status"] = status(13, "Internal Error");
        }
    }
    result
}

#[get("/submissions/{token}")]
async fn get_submission(
    path: web::Path<String>,
    state: web::Data<Arc<Mutex<MockJudge0State>>>,
) -> HttpResponse {
    let token = path.into_inner();
    let mut state = state.lock().unwrap();
    let Some(job) = state.jobs.get_mut(&token) else {
        return HttpResponse::NotFound().json(json!({ "error": "not found" }));
    };
    job.polls += 1;

    let body = if job.polls == 1 {
        json!({ "token": token, "status": status(1, "In Queue") })
    } else if job.code == "forever" {
        json!({ "token": token, "status": status(2, "Processing") })
    } else {
        finished(&token, job)
    };
    HttpResponse::Ok().json(body)
}

/// Mock Judge0 server.
pub struct MockJudge0 {
    pub base_url: String,
    pub state: Arc<Mutex<MockJudge0State>>,
}

impl MockJudge0 {
    /// Start the mock on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockJudge0State::default()));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let state_data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state_data.clone()))
                .service(create_submission)
                .service(get_submission)
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        actix_web::rt::spawn(server);

        MockJudge0 { base_url, state }
    }

    /// Stdin of every submission received so far.
    pub fn stdins(&self) -> Vec<String> {
        self.state.lock().unwrap().stdins.clone()
    }

    /// API key header of every submission received so far.
    pub fn api_keys(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().api_keys.clone()
    }
}
