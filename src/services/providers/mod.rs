//! Upstream completion provider abstraction.
//!
//! A provider performs exactly one outbound call per inbound request
//! and translates the outcome into a closed set of error kinds. No
//! retries, no caching, no batching.

pub mod mock;
pub mod openrouter;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Usage;

/// Error type for provider operations. Variants carry the upstream
/// message where one is available.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Upstream rejected credentials: {0}")]
    AuthFailed(String),

    #[error("Upstream rejected request: {0}")]
    InvalidRequest(String),

    #[error("Upstream rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Upstream API error: {0}")]
    Api(String),

    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Parameters for a single generation call, with defaults already
/// resolved by the handler.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Result of a successful provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Generated text.
    pub content: String,

    /// Model that served the request.
    pub model: String,

    /// Token accounting as reported upstream.
    pub usage: Usage,
}

/// Trait for text completion providers.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Perform a single completion call.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Report whether the provider is usable (credential present).
    async fn health_check(&self) -> Result<(), ProviderError>;
}
