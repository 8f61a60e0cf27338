use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::ChatvoxError;

/// Hosted language model that answers one prompt under a system instruction.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, prompt: &str, system_instruction: &str)
        -> Result<String, ChatvoxError>;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Builds a client with the request timeout and, when a key is set, a bearer
/// `Authorization` header on every request.
pub(crate) fn http_client(
    timeout_ms: u64,
    api_key: &str,
) -> Result<reqwest::Client, ChatvoxError> {
    let mut builder = reqwest::Client::builder().timeout(Duration::from_millis(timeout_ms));

    if !api_key.is_empty() {
        let mut headers = reqwest::header::HeaderMap::new();
        let value = format!("Bearer {}", api_key);
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&value)
                .map_err(|e| ChatvoxError::Config(format!("invalid API key: {}", e)))?,
        );
        builder = builder.default_headers(headers);
    }

    builder
        .build()
        .map_err(|e| ChatvoxError::Config(format!("failed to build HTTP client: {}", e)))
}

/// Client for OpenAI-compatible chat-completion endpoints.
pub struct LlmClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ChatvoxError> {
        let client = http_client(config.timeout_ms, &config.api_key)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn build_request(&self, prompt: &str, system_instruction: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_instruction.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<String, ChatvoxError> {
        debug!("Sending {} chars to {}", prompt.len(), self.model);

        let request = self.build_request(prompt, system_instruction);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatvoxError::Generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ChatvoxError::Generation(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatvoxError::Generation(format!("failed to parse response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ChatvoxError::Generation("empty response from model".to_string()))?;

        debug!("Model replied with {} chars", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_accepts_plain_key() {
        assert!(http_client(5000, "sk-test").is_ok());
        assert!(http_client(5000, "").is_ok());
    }

    #[test]
    fn test_http_client_rejects_key_with_newline() {
        let err = http_client(5000, "sk-test\nX-Injected: 1").unwrap_err();
        assert!(matches!(err, ChatvoxError::Config(_)));
        assert!(err.to_string().contains("invalid API key"));
    }

    fn config() -> LlmConfig {
        LlmConfig {
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "llama3".to_string(),
            timeout_ms: 5000,
            temperature: 0.7,
        }
    }

    #[test]
    fn test_llm_client_new() {
        assert!(LlmClient::new(&config()).is_ok());
    }

    #[test]
    fn test_llm_client_with_api_key() {
        let mut config = config();
        config.api_key = "sk-test-key".to_string();
        assert!(LlmClient::new(&config).is_ok());
    }

    #[test]
    fn test_llm_client_rejects_invalid_api_key() {
        let mut config = config();
        config.api_key = "bad\nkey".to_string();
        assert!(LlmClient::new(&config).is_err());
    }

    #[test]
    fn test_request_carries_system_instruction() {
        let client = LlmClient::new(&config()).unwrap();
        let request = client.build_request("hello", "You are a pirate.");
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model\":\"llama3\""));
        assert!(json.contains(r#"{"role":"system","content":"You are a pirate."}"#));
        assert!(json.contains(r#"{"role":"user","content":"hello"}"#));
    }

    #[test]
    fn test_chat_response_deserialization() {
        let json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Hello, world!"
                }
            }]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("Hello, world!")
        );
    }

    #[test]
    fn test_chat_response_null_content() {
        let json = r#"{"choices": [{"message": {"content": null}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_generate_unreachable_endpoint_fails() {
        let mut config = config();
        config.endpoint = "http://127.0.0.1:9/v1/chat/completions".to_string();
        config.timeout_ms = 1000;
        let client = LlmClient::new(&config).unwrap();
        let err = client.generate("hi", "be nice").await.unwrap_err();
        assert!(matches!(err, ChatvoxError::Generation(_)));
    }
}
