//! Gemini client implementation for taskforge.
//!
//! Wraps the `models/{model}:generateContent` REST endpoint. A request is a
//! model identifier plus an ordered sequence of text segments; the response
//! is the generated text. Service failures (network, auth, quota, malformed
//! body) surface as [`LlmError`] and are fatal to whichever pipeline stage
//! issued the call.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::LlmError;

/// Default public endpoint for the Gemini API.
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default model, matching the rest of the pipeline's expectations.
const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Request for text generation from an LLM.
///
/// Segments are sent in order as separate user contents; the model sees them
/// as one concatenated context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier to use for generation. Empty selects the client default.
    pub model: String,
    /// Ordered text segments forming the prompt context.
    pub segments: Vec<String>,
    /// Sampling temperature (0.0 - 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Create a new generation request with default sampling parameters.
    pub fn new(model: impl Into<String>, segments: Vec<String>) -> Self {
        Self {
            model: model.into(),
            segments,
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max output tokens for this request.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Response from an LLM generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model that produced this response.
    pub model: String,
    /// Generated candidates, best first.
    pub candidates: Vec<Candidate>,
    /// Token usage statistics, when the service reports them.
    pub usage: Option<TokenUsage>,
}

impl GenerationResponse {
    /// Get the text of the first candidate, if available.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates.first().map(|c| c.text.as_str())
    }
}

/// A single generated candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Generated text, with multi-part candidates already concatenated.
    pub text: String,
    /// Reason the generation stopped (e.g., "STOP", "MAX_TOKENS").
    pub finish_reason: Option<String>,
}

/// Token usage statistics for a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for LLM providers that can generate text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    /// Base URL for the API.
    api_base: String,
    /// API key sent via the `x-goog-api-key` header.
    api_key: String,
    /// Default model to use when a request leaves it empty.
    default_model: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client with explicit configuration.
    pub fn new(api_base: String, api_key: String, default_model: String) -> Self {
        Self {
            api_base,
            api_key,
            default_model,
            http_client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Create a client for the public Gemini endpoint with the default model.
    pub fn new_with_defaults(api_key: String) -> Self {
        Self::new(
            DEFAULT_API_BASE.to_string(),
            api_key,
            DEFAULT_MODEL.to_string(),
        )
    }

    /// Create a new Gemini client from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `GEMINI_API_KEY`: API key for authentication (required)
    /// - `GEMINI_API_BASE`: Base URL override (defaults to the public endpoint)
    /// - `GEMINI_DEFAULT_MODEL`: Default model (defaults to "gemini-2.0-flash-lite")
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if `GEMINI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env::var("GEMINI_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
        let api_base =
            env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let default_model =
            env::var("GEMINI_DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_base, api_key, default_model))
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Internal request structure for the generateContent API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Internal response structure from the generateContent API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<ApiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    content: Option<ApiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: u32,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)] // Fields kept for complete API error deserialization
struct ApiErrorDetail {
    message: String,
    code: Option<u16>,
    status: Option<String>,
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let generation_config =
            if request.temperature.is_some() || request.max_output_tokens.is_some() {
                Some(ApiGenerationConfig {
                    temperature: request.temperature,
                    max_output_tokens: request.max_output_tokens,
                })
            } else {
                None
            };

        let api_request = ApiRequest {
            contents: request
                .segments
                .into_iter()
                .map(|text| ApiContent {
                    role: Some("user".to_string()),
                    parts: vec![ApiPart { text }],
                })
                .collect(),
            generation_config,
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, model
        );

        let http_response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();

            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            // Try to parse as structured error
            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                if status_code == 429 {
                    return Err(LlmError::RateLimited(error_response.error.message));
                }

                return Err(LlmError::ApiError {
                    code: status_code,
                    message: error_response.error.message,
                });
            }

            // Fall back to raw error text
            return Err(LlmError::ApiError {
                code: status_code,
                message: error_text,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        let candidates = api_response
            .candidates
            .into_iter()
            .map(|candidate| Candidate {
                text: candidate
                    .content
                    .map(|content| {
                        content
                            .parts
                            .into_iter()
                            .map(|p| p.text)
                            .collect::<Vec<_>>()
                            .join("")
                    })
                    .unwrap_or_default(),
                finish_reason: candidate.finish_reason,
            })
            .collect();

        Ok(GenerationResponse {
            model,
            candidates,
            usage: api_response.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
        })
    }
}
