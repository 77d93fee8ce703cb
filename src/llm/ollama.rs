use crate::llm::client::{build_http_client, check_status, send_error, LLMClient, ModelParams};
use crate::types::{AppError, GenerationFailureReason, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, connect_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(connect_timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate_with_system(
        &self,
        system: Option<&str>,
        prompt: &str,
        params: &ModelParams,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": params.temperature,
                "top_p": params.top_p
            }
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error("Ollama", e))?;
        let response = check_status("Ollama", response).await?;

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            AppError::generation(
                GenerationFailureReason::MalformedResponse,
                format!("Ollama response could not be parsed: {}", e),
            )
        })?;

        Ok(parsed.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
