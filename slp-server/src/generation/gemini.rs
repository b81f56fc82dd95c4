//! Gemini `generateContent` client
//!
//! # API Reference
//! - Endpoint: `{base_url}/models/{model}:generateContent?key={api_key}`
//! - Request: `contents[].parts[].text`, optional `systemInstruction`
//! - Response: text parts of the first candidate, concatenated

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use slp_common::config::GenerationConfig;
use std::time::Duration;
use tracing::{debug, warn};

use super::{GenerationRequest, TextGenerator, UpstreamError};

/// Gemini REST client
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client from the generation configuration
    pub fn new(api_key: String, config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .user_agent(concat!("slp-server/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn request_body(request: &GenerationRequest) -> GenerateContentBody<'_> {
    GenerateContentBody {
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part { text: &request.prompt }],
        }],
        system_instruction: request.system_instruction.as_deref().map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
    }
}

/// Concatenated text of the first candidate
fn response_text(body: &str) -> Result<String, UpstreamError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(UpstreamError::EmptyResponse);
    }
    Ok(text)
}

/// Error message from a non-2xx body, falling back to the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, UpstreamError> {
        debug!("Gemini request: model={}, prompt {} chars", self.model, request.prompt.len());

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    // without_url keeps the API key out of the message
                    UpstreamError::Network(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!("Gemini returned HTTP {}: {}", status.as_u16(), message);
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response_text(&body)?;
        debug!("Gemini response: {} chars", text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
