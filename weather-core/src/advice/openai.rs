use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AdviceProvider, AdvisorId, AnalysisRequest, ChatMessage, ProviderMiss, non_empty};
use crate::config::OpenAiConfig;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Chat-completions tier.
#[derive(Debug, Clone)]
pub struct OpenAiAdvisor {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl OpenAiAdvisor {
    /// `None` when no API key is configured.
    pub fn from_config(config: &OpenAiConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;

        Some(Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: TIMEOUT,
            http: Client::new(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[async_trait]
impl AdviceProvider for OpenAiAdvisor {
    fn id(&self) -> AdvisorId {
        AdvisorId::OpenAi
    }

    async fn try_analyze(&self, request: &AnalysisRequest) -> Result<String, ProviderMiss> {
        let body = CompletionRequest {
            model: &self.model,
            messages: request.chat_messages(),
            temperature: 0.7,
        };

        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(ProviderMiss::Status(status.as_u16()));
        }

        let parsed: CompletionResponse = res.json().await?;
        non_empty(parsed.choices.into_iter().next().and_then(|c| c.message.content))
    }
}
