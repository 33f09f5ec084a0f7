pub mod config;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::BotConfig;
use crate::llm::config::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

pub const SYSTEM_PROMPT: &str = "Ты психолог. Отвечай эмпатично и профессионально.";

/// Источник автоматического ответа, если оператор молчит.
#[async_trait]
pub trait FallbackResponder: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String>;
}

/// Клиент chat-completions API. Один запрос, без повторов и таймаута.
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, message: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(message)],
        }
    }

    pub async fn chat(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            bail!("LLM API returned {}: {}", status, text);
        }

        Ok(serde_json::from_str::<ChatCompletionResponse>(&text)?)
    }
}

#[async_trait]
impl FallbackResponder for LlmClient {
    async fn reply(&self, message: &str) -> Result<String> {
        let request = self.build_request(message);
        log::debug!("Requesting completion from {} ({} chars)", self.model, message.len());

        self.chat(&request)
            .await?
            .into_content()
            .ok_or_else(|| anyhow!("LLM API returned an empty completion"))
    }
}
