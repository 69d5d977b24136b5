use thiserror::Error;

/// The error taxonomy surfaced by engine components.
///
/// A malformed structured LLM reply is deliberately absent: the generator
/// recovers from it locally by keeping the raw text with zero saliency.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed required input. Fail fast, surfaced verbatim.
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation name not present in the registry.
    #[error("no operation named '{name}' has been registered")]
    UnknownOperation { name: String },

    /// Upstream LLM failure: exhausted rate-limit retries or a
    /// non-retryable error. Not retried further by the engine.
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EngineError {
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
            source: None,
        }
    }

    pub fn gateway_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Gateway {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
