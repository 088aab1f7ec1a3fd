//! LLM provider clients (SPEC_FULL.md §4.E points 1-3).
//!
//! [`LlmProvider`] is the seam both concrete providers implement; the
//! adjudicator only ever depends on the trait, never on a specific vendor.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{ConfigError, Error, Result};

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Send one completion request, returning the raw text response.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[cfg(feature = "anthropic")]
mod anthropic {
    use super::*;

    const API_URL: &str = "https://api.anthropic.com/v1/messages";
    const API_VERSION: &str = "2023-06-01";

    pub struct AnthropicProvider {
        client: Client,
        api_key: String,
        model: String,
        max_tokens: usize,
        temperature: f64,
    }

    impl AnthropicProvider {
        #[must_use]
        pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> Self {
            Self {
                client: Client::new(),
                api_key: api_key.into(),
                model: config.model.clone(),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            }
        }
    }

    #[derive(Serialize)]
    struct Request {
        model: String,
        max_tokens: usize,
        temperature: f64,
        messages: Vec<Message>,
    }

    #[derive(Serialize)]
    struct Message {
        role: &'static str,
        content: String,
    }

    #[derive(Deserialize)]
    struct Response {
        content: Vec<ContentBlock>,
    }

    #[derive(Deserialize)]
    struct ContentBlock {
        text: String,
    }

    #[async_trait]
    impl LlmProvider for AnthropicProvider {
        fn name(&self) -> &'static str {
            "anthropic"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            let request = Request {
                model: self.model.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                messages: vec![Message { role: "user", content: prompt.to_string() }],
            };

            let response: Response = self
                .client
                .post(API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            Ok(response.content.into_iter().map(|c| c.text).collect::<Vec<_>>().join(""))
        }
    }
}

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;

#[cfg(feature = "openai")]
mod openai {
    use super::*;

    const API_URL: &str = "https://api.openai.com/v1/chat/completions";

    pub struct OpenAiProvider {
        client: Client,
        api_key: String,
        model: String,
        max_tokens: usize,
        temperature: f64,
    }

    impl OpenAiProvider {
        #[must_use]
        pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> Self {
            Self {
                client: Client::new(),
                api_key: api_key.into(),
                model: config.model.clone(),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            }
        }
    }

    #[derive(Serialize)]
    struct Request {
        model: String,
        max_tokens: usize,
        temperature: f64,
        messages: Vec<Message>,
    }

    #[derive(Serialize)]
    struct Message {
        role: &'static str,
        content: String,
    }

    #[derive(Deserialize)]
    struct Response {
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: ResponseMessage,
    }

    #[derive(Deserialize)]
    struct ResponseMessage {
        content: String,
    }

    #[async_trait]
    impl LlmProvider for OpenAiProvider {
        fn name(&self) -> &'static str {
            "openai"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            let request = Request {
                model: self.model.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                messages: vec![Message { role: "user", content: prompt.to_string() }],
            };

            let response: Response = self
                .client
                .post(API_URL)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            Ok(response
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .unwrap_or_default())
        }
    }
}

#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

/// Build the configured provider from environment-sourced credentials
/// (§9 design notes — secrets never live in the TOML config file).
pub fn from_config(config: &crate::config::PipelineConfig) -> Result<Box<dyn LlmProvider>> {
    let api_key = config.llm_api_key()?;
    match config.llm.provider {
        #[cfg(feature = "anthropic")]
        crate::config::LlmProviderKind::Anthropic => {
            Ok(Box::new(AnthropicProvider::new(api_key, &config.llm)))
        }
        #[cfg(not(feature = "anthropic"))]
        crate::config::LlmProviderKind::Anthropic => Err(Error::Config(ConfigError::InvalidValue {
            field: "llm.provider",
            reason: "anthropic feature not enabled".to_string(),
        })),

        #[cfg(feature = "openai")]
        crate::config::LlmProviderKind::OpenAi => Ok(Box::new(OpenAiProvider::new(api_key, &config.llm))),
        #[cfg(not(feature = "openai"))]
        crate::config::LlmProviderKind::OpenAi => Err(Error::Config(ConfigError::InvalidValue {
            field: "llm.provider",
            reason: "openai feature not enabled".to_string(),
        })),
    }
}
