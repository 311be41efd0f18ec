//! LLM integration for taskforge.
//!
//! Provides the `LlmProvider` trait consumed by the pipeline stages and a
//! client for the Gemini `generateContent` API. The adapter is a single-shot
//! request/response call with no streaming and no retry policy of its own;
//! retries belong to the repair loop, not this layer.

pub mod gemini;

pub use gemini::{
    Candidate, GeminiClient, GenerationRequest, GenerationResponse, LlmProvider, TokenUsage,
};
