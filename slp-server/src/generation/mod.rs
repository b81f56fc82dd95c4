//! Upstream text generation
//!
//! Every parser input comes from one call to a [`TextGenerator`]. The
//! production implementation is [`gemini::GeminiClient`]; tests substitute a
//! scripted generator.
//!
//! Failures are split in two:
//! - [`UpstreamError`]: the call itself failed (network, quota, missing key)
//! - [`slp_common::ParseError`]: the call succeeded but the text was unusable

pub mod gemini;
pub mod prompts;
pub mod service;

use async_trait::async_trait;
use slp_common::ParseError;
use thiserror::Error;
use tracing::{debug, warn};

pub use gemini::GeminiClient;

/// One generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Standing instructions sent separately from the prompt
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Failure of the upstream call itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("Generation service is not configured (no API key)")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Generation request timed out")]
    Timeout,

    #[error("Generation service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Generation service returned no text")]
    EmptyResponse,

    #[error("Unreadable response from generation service: {0}")]
    InvalidResponse(String),
}

/// Anything that can go wrong turning a prompt into records
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Text generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one prompt and return the raw response text
    async fn generate(&self, request: &GenerationRequest) -> Result<String, UpstreamError>;

    /// Model identifier, for status reporting
    fn model(&self) -> &str;

    /// False when every call is known to fail with [`UpstreamError::NotConfigured`]
    fn is_configured(&self) -> bool {
        true
    }
}

/// Stand-in used when no API key is available
///
/// The server still starts; generation endpoints answer `UPSTREAM_FAILURE`.
#[derive(Debug, Default, Clone)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, UpstreamError> {
        Err(UpstreamError::NotConfigured)
    }

    fn model(&self) -> &str {
        "unconfigured"
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Round-trip check against the generation service
///
/// True when the service answered and the answer acknowledges the request.
pub async fn test_connection(generator: &dyn TextGenerator) -> bool {
    match generator
        .generate(&GenerationRequest::new(prompts::CONNECTION_TEST_PROMPT))
        .await
    {
        Ok(text) => {
            let ok = text.to_lowercase().contains("successful");
            debug!("Connection test reply ({} chars), ok={}", text.len(), ok);
            ok
        }
        Err(e) => {
            warn!("Generation connection test failed: {}", e);
            false
        }
    }
}
