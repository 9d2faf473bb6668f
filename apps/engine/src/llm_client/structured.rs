//! Schema-validated model calls with the engine's single re-prompt.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{LanguageModelClient, PromptSchema};
use crate::errors::EngineError;

const OPERATION: &str = "extract_structured";

/// Calls `extract_structured`, deserializes into `T` and runs `validate`.
///
/// A malformed answer (unparseable JSON, wrong shape, failed validation) is
/// retried once with `schema.stricter()`. A second malformed answer becomes
/// `EngineError::Extraction`. Transport failures and timeouts are returned
/// immediately: the engine never retries those.
pub(crate) async fn request_validated<T, F>(
    client: &dyn LanguageModelClient,
    schema: &PromptSchema,
    text: &str,
    timeout_ms: u64,
    validate: F,
) -> Result<T, EngineError>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Result<(), String>,
{
    let mut current = schema.clone();
    let mut last_problem = String::new();

    for attempt in 0..2 {
        if attempt > 0 {
            warn!(
                schema = schema.name,
                problem = %last_problem,
                "malformed model output, retrying once with stricter prompt"
            );
            current = schema.stricter();
        }

        let call = client.extract_structured(&current, text);
        let outcome = match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                return Err(EngineError::ProviderTimeout {
                    operation: OPERATION,
                    timeout_ms,
                })
            }
        };

        let value = match outcome {
            Ok(value) => value,
            Err(e) if e.is_malformed_output() => {
                last_problem = e.to_string();
                continue;
            }
            Err(e) => return Err(EngineError::from_provider(OPERATION, timeout_ms, e)),
        };

        let parsed: T = match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                last_problem = format!("schema mismatch: {e}");
                continue;
            }
        };

        if let Err(problem) = validate(&parsed) {
            last_problem = format!("validation failed: {problem}");
            continue;
        }

        debug!(
            schema = schema.name,
            attempt,
            client = client.name(),
            "structured extraction accepted"
        );
        return Ok(parsed);
    }

    Err(EngineError::Extraction(format!(
        "{} output rejected after retry: {}",
        schema.name, last_problem
    )))
}
