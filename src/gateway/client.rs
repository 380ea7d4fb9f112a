use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::types::{ChatResponse, Message};
use crate::config::Config;
use crate::errors::AiError;

/// Trait abstraction over the generative-AI capability, enabling test
/// mocking and alternative providers. Implementations classify failures
/// into typed `AiError`s at this boundary; callers never inspect message
/// text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate free text from a prompt.
    async fn generate_text(&self, prompt: &str) -> std::result::Result<String, AiError>;

    /// Describe a base64-encoded image, guided by a prompt.
    async fn analyze_image(
        &self,
        prompt: &str,
        image_base64: &str,
        media_type: &str,
    ) -> std::result::Result<String, AiError>;
}

/// Base64-encode raw image bytes for `ModelClient::analyze_image`.
pub fn encode_image(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// `ModelClient` backed by an OpenAI-compatible `/chat/completions`
/// endpoint.
pub struct HttpModelClient {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    api_key: Option<String>,
}

impl HttpModelClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.gateway.request_timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key: config.api_key.clone(),
        })
    }

    async fn chat(&self, body: serde_json::Value) -> std::result::Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Sending AI request to {}", url);

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AiError::Timeout
            } else {
                AiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();

            let mut err = AiError::from_status(status.as_u16(), &text);
            if let AiError::RateLimited {
                ref mut retry_after_secs,
            } = err
            {
                *retry_after_secs = retry_after;
            }
            return Err(err);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;
        parsed.into_text()
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn generate_text(&self, prompt: &str) -> std::result::Result<String, AiError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [Message::user(prompt)],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });
        self.chat(body).await
    }

    async fn analyze_image(
        &self,
        prompt: &str,
        image_base64: &str,
        media_type: &str,
    ) -> std::result::Result<String, AiError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {
                        "url": format!("data:{};base64,{}", media_type, image_base64)
                    }}
                ]
            }],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });
        self.chat(body).await
    }
}
