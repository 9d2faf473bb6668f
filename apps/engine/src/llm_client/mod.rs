/// Language model client seam.
///
/// ARCHITECTURAL RULE: no engine module talks to a model provider directly.
/// Everything goes through `LanguageModelClient`, which callers inject.
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod anthropic;
pub mod embedding;
pub mod prompts;
pub mod structured;

pub use anthropic::AnthropicClient;
pub use embedding::{HashEmbedder, LocalClient};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model returned malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Request timed out")]
    Timeout,

    #[error("Operation not supported by this client: {0}")]
    Unsupported(&'static str),
}

impl ProviderError {
    /// Failures a caller may reasonably retry with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(e) => e.is_timeout() || e.is_connect(),
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::RateLimited { .. } | ProviderError::Timeout => true,
            ProviderError::MalformedJson(_)
            | ProviderError::EmptyContent
            | ProviderError::Unsupported(_) => false,
        }
    }

    /// Output-shape failures, as opposed to transport failures. These are the
    /// only ones the engine answers with a stricter re-prompt.
    pub fn is_malformed_output(&self) -> bool {
        matches!(
            self,
            ProviderError::MalformedJson(_) | ProviderError::EmptyContent
        )
    }
}

/// A fixed-schema extraction request.
#[derive(Debug, Clone)]
pub struct PromptSchema {
    pub name: &'static str,
    pub instructions: String,
    /// Example object showing the exact shape the model must return.
    pub schema: Value,
    /// Set on the retry after a malformed response.
    pub strict: bool,
}

impl PromptSchema {
    pub fn new(name: &'static str, instructions: impl Into<String>, schema: Value) -> Self {
        Self {
            name,
            instructions: instructions.into(),
            schema,
            strict: false,
        }
    }

    pub fn stricter(&self) -> Self {
        Self {
            strict: true,
            ..self.clone()
        }
    }

    /// Builds the user prompt for `text`.
    pub fn render(&self, text: &str) -> String {
        let schema = serde_json::to_string_pretty(&self.schema).unwrap_or_default();
        let mut prompt = format!(
            "{}\n\nReturn a JSON object with this EXACT schema (no extra fields):\n{}",
            self.instructions, schema
        );
        if self.strict {
            prompt.push_str("\n\n");
            prompt.push_str(prompts::STRICT_RETRY_INSTRUCTION);
        }
        prompt.push_str("\n\nINPUT:\n");
        prompt.push_str(text);
        prompt
    }
}

/// The two capabilities the engine consumes from a model provider.
///
/// Implementations own transport concerns (auth, HTTP retries, provider
/// selection). The engine adds its own deadline around every call.
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Returns the model's JSON answer for `schema` applied to `text`.
    async fn extract_structured(
        &self,
        schema: &PromptSchema,
        text: &str,
    ) -> Result<Value, ProviderError>;

    /// Returns a fixed-length embedding of `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Recovers a JSON object from model output.
///
/// Tries, in order: the whole text, each fenced block, then the outermost
/// `{ ... }` span.
pub fn parse_model_json(text: &str) -> Result<Value, ProviderError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::EmptyContent);
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    for block in fenced_blocks(text) {
        if let Ok(value) = serde_json::from_str::<Value>(block) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            let candidate = &text[start..=end];
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                return Ok(value);
            }
            let without_fences = candidate.replace("```", "");
            if let Ok(value) = serde_json::from_str::<Value>(without_fences.trim()) {
                return Ok(value);
            }
            return Err(ProviderError::MalformedJson(preview(text)));
        }
    }

    Err(ProviderError::MalformedJson(format!(
        "no JSON object found in: {}",
        preview(text)
    )))
}

/// Bodies of ```json ... ``` or ``` ... ``` blocks, in order.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let body_start = after
            .strip_prefix("json")
            .or_else(|| after.strip_prefix("JSON"))
            .unwrap_or(after);
        match body_start.find("```") {
            Some(close) => {
                blocks.push(body_start[..close].trim());
                rest = &body_start[close + 3..];
            }
            None => break,
        }
    }
    blocks
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        let cut: String = text.chars().take(LIMIT).collect();
        format!("{cut}... (truncated)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_json() {
        let value = parse_model_json("{\"key\": \"value\"}").unwrap();
        assert_eq!(value, json!({"key": "value"}));
    }

    #[test]
    fn test_parse_json_fence_with_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(parse_model_json(input).unwrap(), json!({"key": "value"}));
    }

    #[test]
    fn test_parse_json_fence_without_tag() {
        let input = "Here you go:\n```\n{\"key\": 1}\n```\nThanks";
        assert_eq!(parse_model_json(input).unwrap(), json!({"key": 1}));
    }

    #[test]
    fn test_parse_brace_span_with_chatter() {
        let input = "Sure! The answer is {\"skills\": []} as requested.";
        assert_eq!(parse_model_json(input).unwrap(), json!({"skills": []}));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_model_json("I cannot help with that").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedJson(_)));
    }

    #[test]
    fn test_parse_rejects_broken_object() {
        let err = parse_model_json("{\"skills\": [}").unwrap_err();
        assert!(err.is_malformed_output());
    }

    #[test]
    fn test_parse_empty_is_empty_content() {
        assert!(matches!(
            parse_model_json("   ").unwrap_err(),
            ProviderError::EmptyContent
        ));
    }

    #[test]
    fn test_strict_render_appends_instruction() {
        let schema = PromptSchema::new("demo", "Extract things.", json!({"things": []}));
        assert!(!schema.render("abc").contains(prompts::STRICT_RETRY_INSTRUCTION));
        let strict = schema.stricter();
        let rendered = strict.render("abc");
        assert!(rendered.contains(prompts::STRICT_RETRY_INSTRUCTION));
        assert!(rendered.ends_with("INPUT:\nabc"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Api {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!ProviderError::Api {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!ProviderError::MalformedJson(String::new()).is_transient());
    }
}
