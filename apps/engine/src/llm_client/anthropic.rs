//! Anthropic Messages API adapter.
//!
//! Structured extraction goes to Claude as a single user turn plus an
//! assistant turn prefilled with `{`, so the answer starts inside the JSON
//! object. The Messages API has no embedding endpoint, so `embed` delegates to
//! the local `HashEmbedder`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::embedding::HashEmbedder;
use super::prompts::{JSON_ONLY_SYSTEM, STRICT_SYSTEM_SUFFIX};
use super::{parse_model_json, LanguageModelClient, PromptSchema, ProviderError};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
/// Model used for every extraction call. Hardcoded to prevent drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_OUTPUT_TOKENS: u32 = 2048;
const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 8_000;
const JSON_PREFILL: &str = "{";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: [Turn<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Turn<'a> {
    role: &'a str,
    content: &'a str,
}

impl<'a> MessagesRequest<'a> {
    /// Request for one extraction. The strict variant repeats the schema rule
    /// in the system prompt as well as in the user turn.
    fn extraction(schema: &PromptSchema, prompt: &'a str) -> Self {
        let mut system = format!("{JSON_ONLY_SYSTEM} Task: {}.", schema.name);
        if schema.strict {
            system.push(' ');
            system.push_str(STRICT_SYSTEM_SUFFIX);
        }
        Self {
            model: MODEL,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: 0.0,
            system,
            messages: [
                Turn {
                    role: "user",
                    content: prompt,
                },
                Turn {
                    role: "assistant",
                    content: JSON_PREFILL,
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    /// The completed JSON text: the prefill plus every text block, in order.
    fn json_text(&self) -> Result<String, ProviderError> {
        let body: String = self
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        if body.trim().is_empty() {
            return Err(ProviderError::EmptyContent);
        }
        // Truncated output counts as malformed.
        if self.stop_reason.as_deref() == Some("max_tokens") {
            return Err(ProviderError::MalformedJson(format!(
                "answer truncated at {} output tokens",
                self.usage.output_tokens
            )));
        }
        if body.trim_start().starts_with('{') {
            Ok(body)
        } else {
            Ok(format!("{JSON_PREFILL}{body}"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Outcome of one HTTP exchange.
enum Exchange {
    Done(MessagesResponse),
    /// Worth another attempt after the given delay hint, if any.
    Retry(ProviderError, Option<Duration>),
}

fn backoff(attempt: u32, hint: Option<Duration>) -> Duration {
    let exponential = BASE_BACKOFF_MS.saturating_mul(1 << attempt.min(6));
    let delay = Duration::from_millis(exponential.min(MAX_BACKOFF_MS));
    hint.map_or(delay, |h| h.max(delay))
}

/// Seconds from a `retry-after` header, when the provider sends one.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Claude-backed `LanguageModelClient`. Rate limits and server errors are
/// retried with capped exponential backoff; everything else returns at once.
#[derive(Clone)]
pub struct AnthropicClient {
    http: Client,
    api_key: String,
    embedder: HashEmbedder,
}

impl AnthropicClient {
    pub fn new(
        api_key: String,
        request_timeout: Duration,
        embedder: HashEmbedder,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            api_key,
            embedder,
        })
    }

    async fn exchange(&self, request: &MessagesRequest<'_>) -> Result<Exchange, ProviderError> {
        let response = match self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(ProviderError::Timeout),
            Err(e) if e.is_connect() => return Ok(Exchange::Retry(ProviderError::Http(e), None)),
            Err(e) => return Err(ProviderError::Http(e)),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let hint = retry_after(&response);
            let message = error_message(response.text().await.unwrap_or_default());
            return Ok(Exchange::Retry(
                ProviderError::Api {
                    status: status.as_u16(),
                    message,
                },
                hint,
            ));
        }
        if !status.is_success() {
            let message = error_message(response.text().await.unwrap_or_default());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Exchange::Done(response.json().await?))
    }

    async fn complete(&self, request: &MessagesRequest<'_>) -> Result<MessagesResponse, ProviderError> {
        let mut last = None;
        for attempt in 0..MAX_ATTEMPTS {
            match self.exchange(request).await? {
                Exchange::Done(response) => {
                    debug!(
                        attempt,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        stop_reason = response.stop_reason.as_deref().unwrap_or("none"),
                        "messages call completed"
                    );
                    return Ok(response);
                }
                Exchange::Retry(err, hint) => {
                    if attempt + 1 < MAX_ATTEMPTS {
                        let delay = backoff(attempt, hint);
                        warn!(error = %err, delay_ms = delay.as_millis() as u64, "retrying messages call");
                        tokio::time::sleep(delay).await;
                    }
                    last = Some(err);
                }
            }
        }
        Err(last.unwrap_or(ProviderError::RateLimited {
            retries: MAX_ATTEMPTS,
        }))
    }
}

#[async_trait]
impl LanguageModelClient for AnthropicClient {
    fn name(&self) -> &str {
        MODEL
    }

    async fn extract_structured(
        &self,
        schema: &PromptSchema,
        text: &str,
    ) -> Result<Value, ProviderError> {
        let prompt = schema.render(text);
        let request = MessagesRequest::extraction(schema, &prompt);
        let response = self.complete(&request).await?;
        parse_model_json(&response.json_text()?)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(self.embedder.embed(text))
    }
}
