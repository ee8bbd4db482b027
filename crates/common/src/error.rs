/// Cardsmith error types
#[derive(Debug, thiserror::Error)]
pub enum CardsmithError {
    /// Missing API key, missing model or otherwise unusable settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Model is not in the provider's known registry
    #[error("Invalid model name {0}")]
    InvalidModel(String),

    /// Provider did not answer within the request time budget
    #[error("Provider request timed out after {0:?}")]
    ProviderTimeout(std::time::Duration),

    /// Non-streaming call returned no usable text
    #[error("No response received from {0} API")]
    ProviderEmptyResponse(String),

    /// Network or API failure (auth, rate limit, malformed response)
    #[error("Provider error: {0}")]
    ProviderTransport(String),

    /// A preset item failed and the remaining items were skipped
    #[error("Preset item {index} ({label}) failed: {source}")]
    BatchAbort {
        index: usize,
        label: String,
        #[source]
        source: Box<CardsmithError>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardsmithError {
    /// Create configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create invalid model error
    pub fn invalid_model<S: Into<String>>(model: S) -> Self {
        Self::InvalidModel(model.into())
    }

    /// Create empty response error for the named provider
    pub fn empty_response<S: Into<String>>(provider: S) -> Self {
        Self::ProviderEmptyResponse(provider.into())
    }

    /// Create transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::ProviderTransport(msg.into())
    }

    /// Wrap an item failure into a batch abort
    pub fn batch_abort<S: Into<String>>(index: usize, label: S, source: CardsmithError) -> Self {
        Self::BatchAbort {
            index,
            label: label.into(),
            source: Box::new(source),
        }
    }

    /// Whether the failure came from the provider side (timeout, empty or transport)
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::ProviderTimeout(_) | Self::ProviderEmptyResponse(_) | Self::ProviderTransport(_)
        )
    }
}

// Process exit codes for the CLI
impl CardsmithError {
    /// Get process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::InvalidModel(_) => 3,
            Self::ProviderTimeout(_) => 4,
            Self::ProviderEmptyResponse(_) => 4,
            Self::ProviderTransport(_) => 4,
            Self::BatchAbort { .. } => 5,
            Self::Io(_) => 1,
            Self::Json(_) => 1,
            Self::Other(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_model_message() {
        let err = CardsmithError::invalid_model("gpt-0");
        assert_eq!(err.to_string(), "Invalid model name gpt-0");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_batch_abort_keeps_source() {
        let err = CardsmithError::batch_abort(1, "Cloze x3", CardsmithError::ProviderTimeout(std::time::Duration::from_secs(60)));
        match &err {
            CardsmithError::BatchAbort { index, label, source } => {
                assert_eq!(*index, 1);
                assert_eq!(label, "Cloze x3");
                assert!(source.is_provider_failure());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("timed out after 60s"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_provider_failure_classification() {
        assert!(CardsmithError::empty_response("OpenAI").is_provider_failure());
        assert!(CardsmithError::transport("HTTP 401").is_provider_failure());
        assert!(!CardsmithError::configuration("missing key").is_provider_failure());
    }
}
