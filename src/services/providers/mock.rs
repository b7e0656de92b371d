//! Mock provider implementations for testing.

use super::{GenerationParams, ProviderError, ProviderResponse, TextProvider};
use crate::models::Usage;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock text provider that echoes the prompt and counts calls.
pub struct MockTextProvider {
    calls: Arc<AtomicUsize>,
}

impl MockTextProvider {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle for asserting how many outbound calls were attempted.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let prompt_tokens = (prompt.len() / 4) as u32;
        let completion_tokens = 10;

        Ok(ProviderResponse {
            content: format!("Mock response for: {}", prompt),
            model: params.model.clone(),
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Mock provider that fails every call with a fixed error, for
/// exercising the error translation table.
pub struct FailingTextProvider {
    make_error: Box<dyn Fn() -> ProviderError + Send + Sync>,
}

impl FailingTextProvider {
    pub fn new<F>(make_error: F) -> Self
    where
        F: Fn() -> ProviderError + Send + Sync + 'static,
    {
        Self {
            make_error: Box::new(make_error),
        }
    }
}

#[async_trait]
impl TextProvider for FailingTextProvider {
    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        Err((self.make_error)())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Err((self.make_error)())
    }
}
