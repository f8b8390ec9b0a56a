//! Judge0 execution collaborator.
//!
//! Submits source code, then polls for the result at a fixed interval while
//! the job is queued or processing. Polling is bounded by `max_polls`; the
//! loop lives in the request future, so a dropped request stops it.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Judge0Settings;
use crate::models::execution::ExecutionResult;

/// HTTP connect timeout for execution service calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// HTTP total timeout for a single execution service call.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Languages accepted by the execution endpoint and their Judge0 ids.
pub const SUPPORTED_LANGUAGES: [(&str, u32); 4] = [
    ("javascript", 93),
    ("python", 92),
    ("java", 91),
    ("cpp", 54),
];

/// Map a language name to its Judge0 language id.
pub fn language_id(language: &str) -> Option<u32> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, id)| *id)
}

/// Execution collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Language '{0}' is not supported.")]
    UnsupportedLanguage(String),

    #[error("Request to execution service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Execution service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Execution service did not return a submission token")]
    MissingToken,

    #[error("Execution still pending after {attempts} polls")]
    Timeout { attempts: u32 },
}

/// Runs source code against an input.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Run `code` written in `language` with `stdin` and wait for the final result.
    async fn execute(
        &self,
        language: &str,
        code: &str,
        stdin: &str,
    ) -> Result<ExecutionResult, ExecutionError>;
}

#[derive(Serialize)]
struct SubmissionRequest<'a> {
    source_code: &'a str,
    language_id: u32,
    stdin: &'a str,
}

#[derive(Deserialize)]
struct SubmissionCreated {
    token: Option<String>,
}

/// Judge0 REST client (RapidAPI flavour).
#[derive(Clone)]
pub struct Judge0Client {
    http: reqwest::Client,
    base_url: String,
    host: String,
    api_key: Option<SecretString>,
    poll_interval: Duration,
    max_polls: u32,
}

impl Judge0Client {
    pub fn new(settings: &Judge0Settings) -> Result<Self, ExecutionError> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;

        if settings.api_key.is_none() {
            warn!("RAPIDAPI_KEY not set; execution requests are sent unauthenticated");
        }

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            host: settings.host.clone(),
            api_key: settings.api_key.clone(),
            poll_interval: settings.poll_interval,
            max_polls: settings.max_polls.max(1),
        })
    }

    fn with_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("X-RapidAPI-Host", &self.host);
        match &self.api_key {
            Some(key) => request.header("X-RapidAPI-Key", key.expose_secret()),
            None => request,
        }
    }

    async fn submit(&self, language_id: u32, code: &str, stdin: &str) -> Result<String, ExecutionError> {
        let url = format!("{}/submissions?base64_encoded=false&fields=*", self.base_url);
        let response = self
            .with_headers(self.http.post(&url))
            .json(&SubmissionRequest {
                source_code: code,
                language_id,
                stdin,
            })
            .send()
            .await?;

        let created: SubmissionCreated = check_status(response).await?.json().await?;
        created
            .token
            .filter(|t| !t.is_empty())
            .ok_or(ExecutionError::MissingToken)
    }

    async fn fetch(&self, token: &str) -> Result<ExecutionResult, ExecutionError> {
        let url = format!(
            "{}/submissions/{}?base64_encoded=false&fields=*",
            self.base_url,
            urlencoding::encode(token)
        );
        let response = self.with_headers(self.http.get(&url)).send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ExecutionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("Execution service returned {}: {}", status, body);
    Err(ExecutionError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CodeExecutor for Judge0Client {
    async fn execute(
        &self,
        language: &str,
        code: &str,
        stdin: &str,
    ) -> Result<ExecutionResult, ExecutionError> {
        let language_id = language_id(language)
            .ok_or_else(|| ExecutionError::UnsupportedLanguage(language.to_string()))?;

        let token = self.submit(language_id, code, stdin).await?;
        debug!(%token, language, "Submitted code for execution");

        for attempt in 1..=self.max_polls {
            let result = self.fetch(&token).await?;
            if !result.is_pending() {
                debug!(%token, attempt, status = result.status.id, "Execution finished");
                return Ok(result);
            }
            if attempt < self.max_polls {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        warn!(%token, polls = self.max_polls, "Execution did not finish in time");
        Err(ExecutionError::Timeout {
            attempts: self.max_polls,
        })
    }
}
