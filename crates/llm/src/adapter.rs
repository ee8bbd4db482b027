use async_trait::async_trait;
use cardsmith_common::{Provider, Result};
use std::sync::Arc;

use crate::anthropic::AnthropicAdapter;
use crate::openai::OpenAiAdapter;
use crate::transport::Transport;
use crate::types::{CompletionCall, FragmentStream};

/// Common contract of the provider backends
///
/// A call resolves once the request is accepted; the returned stream then
/// yields fragments in the order they must be applied.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider served by this adapter
    fn provider(&self) -> Provider;

    /// Reject models the adapter cannot serve (no network access)
    fn validate_model(&self, _model: &str) -> Result<()> {
        Ok(())
    }

    /// Issue a completion call
    async fn complete(&self, call: CompletionCall) -> Result<FragmentStream>;
}

/// Create the adapter for a provider
pub fn create_adapter(
    provider: Provider,
    transport: Arc<dyn Transport>,
    base_url: impl Into<String>,
) -> Arc<dyn ProviderAdapter> {
    match provider {
        Provider::OpenAi => Arc::new(OpenAiAdapter::new(transport, base_url)),
        Provider::Claude => Arc::new(AnthropicAdapter::new(transport, base_url)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    #[test]
    fn test_create_adapter_matches_provider() {
        let transport = Arc::new(MockTransport::new());
        for provider in [Provider::OpenAi, Provider::Claude] {
            let adapter = create_adapter(provider, transport.clone(), "http://localhost");
            assert_eq!(adapter.provider(), provider);
        }
    }
}
