use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{AdviceProvider, AdvisorId, AnalysisRequest, ChatMessage, ProviderMiss, non_empty};
use crate::config::OllamaConfig;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Self-hosted chat tier. Probes the host before asking.
#[derive(Debug, Clone)]
pub struct OllamaAdvisor {
    host: String,
    model: String,
    timeout: Duration,
    http: Client,
}

impl OllamaAdvisor {
    /// `None` when the host is configured as empty.
    pub fn from_config(config: &OllamaConfig) -> Option<Self> {
        let host = config.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return None;
        }

        Some(Self {
            host: host.to_string(),
            model: config.model.clone(),
            timeout: TIMEOUT,
            http: Client::new(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Any HTTP answer counts as reachable; only transport failures do not.
    async fn probe(&self) -> Result<(), ProviderMiss> {
        self.http
            .get(format!("{}/api/tags", self.host))
            .timeout(self.timeout)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| ProviderMiss::Unreachable(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl AdviceProvider for OllamaAdvisor {
    fn id(&self) -> AdvisorId {
        AdvisorId::Ollama
    }

    async fn try_analyze(&self, request: &AnalysisRequest) -> Result<String, ProviderMiss> {
        self.probe().await?;
        debug!(host = %self.host, model = %self.model, "Local model host reachable");

        let body = ChatRequest { model: &self.model, messages: request.chat_messages(), stream: false };

        let res = self
            .http
            .post(format!("{}/api/chat", self.host))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(ProviderMiss::Status(status.as_u16()));
        }

        let parsed: ChatResponse = res.json().await?;
        non_empty(parsed.message.and_then(|m| m.content))
    }
}
