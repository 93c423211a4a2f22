//! OpenAI-compatible chat completions client

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Anything that can turn a chat into a reply
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs and transcripts
    fn name(&self) -> &str;

    /// Complete the conversation and return the assistant's text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Chat completions client for OpenAI and compatible servers
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client with the given request timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
            client,
        })
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Whether `GET /models` answers with success for this key
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.base_url);

        let result = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match result {
            Ok(resp) => {
                debug!(status = %resp.status(), "health_check");
                resp.status().is_success()
            }
            Err(e) => {
                debug!(error = %e, "health_check_failed");
                false
            }
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let req = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("Failed to reach the language model API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Language model request failed: HTTP {}: {}", status, body);
        }

        let body: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        extract_reply(body)
    }
}

fn extract_reply(body: ChatResponse) -> Result<String> {
    let usage = body.usage.unwrap_or_default();
    debug!(
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        "chat_complete"
    );

    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .context("Chat completion returned no choices")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let messages = vec![ChatMessage::system("be a buyer"), ChatMessage::user("hi")];
        let req = ChatRequest {
            model: "gpt-4o",
            messages: &messages,
            temperature: None,
            max_tokens: Some(256),
            stream: false,
        };

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "be a buyer"},
                    {"role": "user", "content": "hi"}
                ],
                "max_tokens": 256,
                "stream": false
            })
        );
    }

    #[test]
    fn test_extract_reply() {
        let body: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Buyer nods."}}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }))
        .unwrap();

        assert_eq!(extract_reply(body).unwrap(), "Buyer nods.");
    }

    #[test]
    fn test_extract_reply_without_choices() {
        let body: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(extract_reply(body).is_err());
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = OpenAiClient::new(
            "http://localhost:8000/v1/",
            "key",
            "local-model",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8000/v1");
        assert_eq!(client.name(), "local-model");
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        // Nothing listens on the discard port
        let client = OpenAiClient::new(
            "http://127.0.0.1:9/v1",
            "key",
            "local-model",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!client.health_check().await);
    }
}
