use crate::llm::client::{build_http_client, check_status, send_error, LLMClient, ModelParams};
use crate::types::{AppError, GenerationFailureReason, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAIClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        connect_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(connect_timeout)?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_system(
        &self,
        system: Option<&str>,
        prompt: &str,
        params: &ModelParams,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            top_p: params.top_p,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("OpenAI", e))?;
        let response = check_status("OpenAI", response).await?;

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::generation(
                GenerationFailureReason::MalformedResponse,
                format!("OpenAI response could not be parsed: {}", e),
            )
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::generation(
                    GenerationFailureReason::MalformedResponse,
                    "OpenAI response contained no message content",
                )
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
