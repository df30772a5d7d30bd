// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! LLM Provider domain interface (anti-corruption layer). Isolates the
//! Synthesizer/Refiner business logic from a specific vendor API.
//! Implementations live in `infrastructure::llm`. See spec §4.3/§6.1.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::contract::Contract;
use crate::domain::tool::Category;

/// Everything the adapter needs to assemble a category-specific prompt and
/// parse the response.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub task: &'a str,
    pub category: Category,
    pub contract: Option<&'a Contract>,
    pub error_context: Option<&'a str>,
}

/// Response shape from spec §4.3/§6.1. `code_payload` is `None` on parse
/// failure (no fenced code block found) or transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub reasoning_trace: String,
    pub code_payload: Option<String>,
    pub text_response: String,
    pub raw: String,
}

#[derive(Debug, thiserror::Error, Clone)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("rate limit exceeded")]
    RateLimit,
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("non-2xx response: {0}")]
    NonSuccessStatus(String),
    #[error("provider error: {0}")]
    Provider(String),
}

/// Anti-corruption-layer trait for LLM providers. Transport failures
/// (timeout, non-2xx, network error) MUST be surfaced as a structured
/// [`LlmError`], never hallucinated as code (spec §4.3/§6.1).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// `generate(task, category, contract?, error_context?) -> Response`.
    /// On transport failure the caller turns the `LlmError` into a
    /// `LlmResponse` with `code_payload = None` and
    /// `text_response = "LLM API Error: <msg>"` — the contract of
    /// [`crate::application::synthesizer::Synthesizer`] and
    /// [`crate::application::refiner::Refiner`] is to call
    /// [`LlmProvider::generate`] and handle `Err` that way, never to retry
    /// with a mock.
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<LlmResponse, LlmError>;

    fn provider_name(&self) -> &str;
    fn model_name(&self) -> &str;
}
