use thiserror::Error;

use crate::llm_client::ProviderError;

/// Engine-level error type. Every public operation returns `Result<T, EngineError>`.
///
/// Matching, aggregation and feedback are total over validated input, so only
/// normalization, extraction and the provider calls can fail.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller gave text with no usable tokens.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Model output failed schema validation after the one allowed retry.
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Provider timed out after {timeout_ms}ms during {operation}")]
    ProviderTimeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Provider error during {operation}: {source}")]
    Provider {
        operation: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Maps a client failure to the engine taxonomy. Transport timeouts reported
    /// by the client itself surface as `ProviderTimeout` like our own deadline.
    pub fn from_provider(operation: &'static str, timeout_ms: u64, err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout => EngineError::ProviderTimeout {
                operation,
                timeout_ms,
            },
            source => EngineError::Provider { operation, source },
        }
    }

    /// Stable machine-readable code for callers that map errors onto a
    /// transport (HTTP status, CLI exit code).
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::EmptyInput(_) => "EMPTY_INPUT",
            EngineError::Extraction(_) => "EXTRACTION_ERROR",
            EngineError::ProviderTimeout { .. } => "PROVIDER_TIMEOUT",
            EngineError::Provider { .. } => "PROVIDER_ERROR",
            EngineError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    /// Errors the user can fix by changing their input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            EngineError::EmptyInput(_) | EngineError::InvalidConfig(_)
        )
    }

    /// Errors worth one caller-side retry with backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::ProviderTimeout { .. } => true,
            EngineError::Provider { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}
