// Copyright 2025 Lifelog Contributors (https://github.com/lifelog-dev/lifelog)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! LLM client abstraction for incremental summarization
//!
//! The summarizer depends only on the [`LlmClient`] trait (prompt in,
//! text or error out), so the concrete transport is swappable and the
//! cycle is testable with a fake. Credentials resolve from the config
//! value, a key file, or the provider's conventional environment
//! variable, in that order.

use async_trait::async_trait;
use lifelog_core::SummaryConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors from LLM clients
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No API key for provider {0}: set it in config, a key file, or the environment")]
    MissingCredentials(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Trait for the external text-generation capability.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a prompt, get generated text. An empty completion is a
    /// failure: the caller must not advance the cursor for it.
    async fn complete(&self, prompt: String) -> Result<String, LlmError>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            api_key,
            model,
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: String) -> Result<String, LlmError> {
        let request = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You summarize terminal and agent activity logs concisely."
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.3
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited);
            }
            return Err(LlmError::Api(error_text));
        }

        let response_data: serde_json::Value = response.json().await?;
        let content = response_data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::InvalidResponse("Missing content".to_string()))?
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(LlmError::InvalidResponse("Empty completion".to_string()));
        }
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Anthropic messages-API client.
pub struct AnthropicClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            api_key,
            model,
            base_url: "https://api.anthropic.com/v1".to_string(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: String) -> Result<String, LlmError> {
        let request = serde_json::json!({
            "model": self.model,
            "max_tokens": 1024,
            "system": "You summarize terminal and agent activity logs concisely.",
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.3
        });

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited);
            }
            return Err(LlmError::Api(error_text));
        }

        let response_data: serde_json::Value = response.json().await?;
        let content = response_data["content"][0]["text"]
            .as_str()
            .ok_or_else(|| LlmError::InvalidResponse("Missing content".to_string()))?
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(LlmError::InvalidResponse("Empty completion".to_string()));
        }
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Build the configured provider's client, resolving credentials.
pub fn build_client(config: &SummaryConfig) -> Result<Box<dyn LlmClient>, LlmError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    match config.provider.as_str() {
        "openai" => {
            let key = resolve_api_key(config, "OPENAI_API_KEY")?;
            info!("Using OpenAI model {}", config.model);
            Ok(Box::new(OpenAiClient::new(key, config.model.clone(), timeout)?))
        }
        "anthropic" => {
            let key = resolve_api_key(config, "ANTHROPIC_API_KEY")?;
            info!("Using Anthropic model {}", config.model);
            Ok(Box::new(AnthropicClient::new(
                key,
                config.model.clone(),
                timeout,
            )?))
        }
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}

/// Config value, then key file, then environment variable. The rest of
/// the system depends only on "a secret string is available".
fn resolve_api_key(config: &SummaryConfig, env_var: &str) -> Result<String, LlmError> {
    if let Some(key) = &config.api_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }
    if let Some(path) = &config.api_key_file {
        if let Ok(contents) = std::fs::read_to_string(path) {
            let key = contents.trim().to_string();
            if !key.is_empty() {
                return Ok(key);
            }
        }
    }
    if let Ok(key) = std::env::var(env_var) {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    Err(LlmError::MissingCredentials(config.provider.clone()))
}
