//! Gemini LLM collaborator.
//!
//! The client is immutable and shared read-only across workers. Conversation
//! history is passed in on every call; nothing is remembered between calls.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmSettings;
use crate::models::chat::{ChatMessage, MessageRole};

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Attempts made for a rate-limited call before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1000;

/// LLM collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("GEMINI_API_KEY is not configured")]
    NotConfigured,

    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("LLM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response contained no text")]
    EmptyResponse,
}

/// Speaker of a conversation turn, in the provider's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One turn of a conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }
}

impl From<&ChatMessage> for ChatTurn {
    fn from(m: &ChatMessage) -> Self {
        Self {
            role: match m.role {
                MessageRole::User => TurnRole::User,
                MessageRole::Assistant => TurnRole::Model,
            },
            text: m.content.clone(),
        }
    }
}

/// Produces text completions for a conversation.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete the conversation; the last turn is the prompt to answer.
    async fn complete(&self, turns: &[ChatTurn]) -> Result<String, LlmError>;

    /// Single-prompt convenience wrapper.
    async fn prompt(&self, text: &str) -> Result<String, LlmError> {
        self.complete(&[ChatTurn::user(text)]).await
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: TurnRole,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini `generateContent` REST client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    retry_base_delay: Duration,
}

impl GeminiClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;

        if settings.api_key.is_none() {
            warn!("GEMINI_API_KEY not set; assistant and contest generation are disabled");
        }

        Ok(Self {
            http,
            endpoint: format!(
                "{}/models/{}:generateContent",
                settings.base_url.trim_end_matches('/'),
                settings.model
            ),
            api_key: settings.api_key.clone(),
            retry_base_delay: settings.retry_base_delay,
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn complete(&self, turns: &[ChatTurn]) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::NotConfigured)?;

        let body = GenerateRequest {
            contents: turns
                .iter()
                .map(|t| Content {
                    role: t.role,
                    parts: [Part { text: &t.text }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let mut delay = self.retry_base_delay;
        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .http
                .post(&self.endpoint)
                .header("x-goog-api-key", api_key.expose_secret())
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!(attempt, delay_ms = delay.as_millis() as u64, "LLM rate limited");
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM returned {}: {}", status, body);
                return Err(LlmError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: GenerateResponse = response.json().await?;
            debug!(attempt, turns = turns.len(), "LLM completion received");
            return parsed.into_text().ok_or(LlmError::EmptyResponse);
        }

        Err(LlmError::RateLimited {
            attempts: MAX_ATTEMPTS,
        })
    }
}
