// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! One concrete HTTP adapter covering OpenAI-compatible chat-completions
//! endpoints (the shape DashScope's compatible mode and most self-hosted
//! gateways expose). Grounded on the teacher's
//! `infrastructure::llm::anthropic::AnthropicAdapter` shape: bearer auth,
//! JSON request/response, non-2xx mapped to a structured [`LlmError`] —
//! never a hallucinated fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::llm::{GenerationRequest, LlmError, LlmProvider, LlmResponse};
use crate::infrastructure::llm::{parser, prompts::PromptAssembler};

pub struct OpenAiCompatibleAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiCompatibleAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleAdapter {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<LlmResponse, LlmError> {
        let prompt = PromptAssembler::assemble(
            request.task,
            request.category,
            request.contract,
            request.error_context,
        );

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: &prompt }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(if status.as_u16() == 401 || status.as_u16() == 403 {
                LlmError::Authentication(text)
            } else if status.as_u16() == 429 {
                LlmError::RateLimit
            } else {
                LlmError::NonSuccessStatus(format!("HTTP {status}: {text}"))
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Provider(format!("failed to parse response: {e}")))?;

        let raw = parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        let extracted = parser::parse(&raw);

        Ok(LlmResponse {
            reasoning_trace: extracted.reasoning_trace,
            code_payload: extracted.code_payload,
            text_response: extracted.text_response,
            raw,
        })
    }

    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Wraps transport failures as the structured error-contract response
/// spec §4.3 requires: `code_payload = None`,
/// `text_response = "LLM API Error: <msg>"`. Callers ([`crate::application::synthesizer::Synthesizer`],
/// [`crate::application::refiner::Refiner`]) apply this after calling
/// `LlmProvider::generate` and receiving an `Err`.
pub fn transport_error_response(err: &LlmError) -> LlmResponse {
    LlmResponse {
        reasoning_trace: String::new(),
        code_payload: None,
        text_response: format!("LLM API Error: {err}"),
        raw: String::new(),
    }
}
