use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AdviceProvider, AdvisorId, AnalysisRequest, ProviderMiss, SYSTEM_PROMPT, non_empty};
use crate::config::HuggingFaceConfig;

const TIMEOUT: Duration = Duration::from_secs(15);
const MAX_NEW_TOKENS: u32 = 180;

/// Hosted text-generation tier. Takes one prompt rather than a chat.
#[derive(Debug, Clone)]
pub struct HuggingFaceAdvisor {
    api_token: String,
    model: String,
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl HuggingFaceAdvisor {
    /// `None` when no API token is configured.
    pub fn from_config(config: &HuggingFaceConfig) -> Option<Self> {
        let api_token = config.api_token.as_deref().map(str::trim).filter(|t| !t.is_empty())?;

        Some(Self {
            api_token: api_token.to_string(),
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

    fn prompt(request: &AnalysisRequest) -> String {
        format!("{SYSTEM_PROMPT}\n\n{}\n\nAnswer:", request.user_message())
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest {
    inputs: String,
    parameters: GenerationParameters,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f64,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct GenerationOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Generated(Vec<Generated>),
    Failed { error: serde_json::Value },
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: Option<String>,
}

#[async_trait]
impl AdviceProvider for HuggingFaceAdvisor {
    fn id(&self) -> AdvisorId {
        AdvisorId::HuggingFace
    }

    async fn try_analyze(&self, request: &AnalysisRequest) -> Result<String, ProviderMiss> {
        let body = GenerationRequest {
            inputs: Self::prompt(request),
            parameters: GenerationParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                temperature: 0.7,
                return_full_text: false,
            },
            options: GenerationOptions { wait_for_model: true },
        };

        let res = self
            .http
            .post(format!("{}/models/{}", self.base_url, self.model))
            .bearer_auth(&self.api_token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(ProviderMiss::Status(status.as_u16()));
        }

        match res.json::<GenerationResponse>().await? {
            GenerationResponse::Generated(items) => {
                non_empty(items.into_iter().next().and_then(|g| g.generated_text))
            }
            GenerationResponse::Failed { error } => Err(ProviderMiss::Rejected(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn advisor(server: &MockServer) -> HuggingFaceAdvisor {
        HuggingFaceAdvisor::from_config(&HuggingFaceConfig {
            api_token: Some("hf_test".into()),
            model: "org/model".into(),
            base_url: server.uri(),
        })
        .unwrap()
    }

    #[test]
    fn prompt_folds_instruction_and_question() {
        let prompt = HuggingFaceAdvisor::prompt(&AnalysisRequest::new("REPORT", "Umbrella?"));
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("Weather report:\nREPORT"));
        assert!(prompt.ends_with("User question: Umbrella?\n\nAnswer:"));
    }

    #[tokio::test]
    async fn returns_generated_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/org/model"))
            .and(header("authorization", "Bearer hf_test"))
            .and(body_partial_json(json!({
                "parameters": { "max_new_tokens": 180, "return_full_text": false },
                "options": { "wait_for_model": true }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "generated_text": "Take an umbrella.\n" }])),
            )
            .mount(&server)
            .await;

        let advice = advisor(&server)
            .try_analyze(&AnalysisRequest::new("report", "q"))
            .await
            .unwrap();
        assert_eq!(advice, "Take an umbrella.");
    }

    #[tokio::test]
    async fn error_object_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": "Model is loading" })),
            )
            .mount(&server)
            .await;

        let miss = advisor(&server)
            .try_analyze(&AnalysisRequest::new("report", "q"))
            .await
            .unwrap_err();
        assert!(matches!(miss, ProviderMiss::Rejected(ref e) if e.contains("Model is loading")));
    }

    #[tokio::test]
    async fn error_status_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let miss = advisor(&server)
            .try_analyze(&AnalysisRequest::new("report", "q"))
            .await
            .unwrap_err();
        assert!(matches!(miss, ProviderMiss::Status(503)));
    }

    #[tokio::test]
    async fn empty_list_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let miss = advisor(&server)
            .try_analyze(&AnalysisRequest::new("report", "q"))
            .await
            .unwrap_err();
        assert!(matches!(miss, ProviderMiss::Empty));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!([{ "generated_text": "late" }])),
            )
            .mount(&server)
            .await;

        let miss = advisor(&server)
            .with_timeout(Duration::from_millis(100))
            .try_analyze(&AnalysisRequest::new("report", "q"))
            .await
            .unwrap_err();
        assert!(matches!(miss, ProviderMiss::Timeout));
    }
}
