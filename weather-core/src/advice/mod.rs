//! Natural-language advice for a rendered weather report.
//!
//! [`AnalysisCascade`] asks each configured language-model provider in
//! priority order and returns the first non-empty answer. The
//! [`rules::RuleEngine`] is always the last tier, so the cascade itself
//! cannot fail.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::{self, Debug};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AdviceConfig;

pub mod huggingface;
pub mod ollama;
pub mod openai;
pub mod parse;
pub mod rules;

pub use huggingface::HuggingFaceAdvisor;
pub use ollama::OllamaAdvisor;
pub use openai::OpenAiAdvisor;
pub use rules::{AdviceTip, RuleEngine, TipCategory};

/// Instruction shared by every language-model tier.
pub const SYSTEM_PROMPT: &str = "You are a helpful weather expert assistant. Based on the provided \
    weather report, answer the user's question with concise, actionable advice in 2-4 short \
    sentences. When clothing or safety is relevant, give practical recommendations.";

/// A report plus the question asked about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub report: String,
    pub user_query: String,
}

impl AnalysisRequest {
    pub fn new(report: impl Into<String>, user_query: impl Into<String>) -> Self {
        Self { report: report.into(), user_query: user_query.into() }
    }

    pub fn user_message(&self) -> String {
        format!("Weather report:\n{}\n\nUser question: {}", self.report, self.user_query)
    }

    pub(crate) fn chat_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
            ChatMessage { role: "user", content: self.user_message() },
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisorId {
    OpenAi,
    HuggingFace,
    Ollama,
    Rules,
}

impl AdvisorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisorId::OpenAi => "openai",
            AdvisorId::HuggingFace => "huggingface",
            AdvisorId::Ollama => "ollama",
            AdvisorId::Rules => "rules",
        }
    }

    /// Priority order of the cascade.
    pub const fn all() -> &'static [AdvisorId] {
        &[AdvisorId::OpenAi, AdvisorId::HuggingFace, AdvisorId::Ollama, AdvisorId::Rules]
    }
}

impl fmt::Display for AdvisorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a provider produced no advice. Never surfaced to callers; the
/// cascade logs it and moves on.
#[derive(Debug, Error)]
pub enum ProviderMiss {
    #[error("request timed out")]
    Timeout,

    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("responded with status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("provider reported an error: {0}")]
    Rejected(String),

    #[error("empty response")]
    Empty,
}

impl From<reqwest::Error> for ProviderMiss {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderMiss::Timeout
        } else if err.is_decode() {
            ProviderMiss::Malformed(err.to_string())
        } else {
            ProviderMiss::Transport(err.to_string())
        }
    }
}

/// One tier of the cascade.
#[async_trait]
pub trait AdviceProvider: Send + Sync + Debug {
    fn id(&self) -> AdvisorId;

    async fn try_analyze(&self, request: &AnalysisRequest) -> Result<String, ProviderMiss>;
}

/// Trimmed text, or [`ProviderMiss::Empty`] when there is nothing to say.
pub(crate) fn non_empty(text: Option<String>) -> Result<String, ProviderMiss> {
    text.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ProviderMiss::Empty)
}

/// Ordered advice providers ending with the rule engine.
#[derive(Debug)]
pub struct AnalysisCascade {
    providers: Vec<Box<dyn AdviceProvider>>,
}

impl AnalysisCascade {
    /// Build the cascade from whatever credentials and hosts are configured.
    pub fn from_config(config: &AdviceConfig) -> Self {
        let mut remote: Vec<Box<dyn AdviceProvider>> = Vec::new();

        if let Some(advisor) = OpenAiAdvisor::from_config(&config.openai) {
            remote.push(Box::new(advisor));
        }
        if let Some(advisor) = HuggingFaceAdvisor::from_config(&config.huggingface) {
            remote.push(Box::new(advisor));
        }
        if let Some(advisor) = OllamaAdvisor::from_config(&config.ollama) {
            remote.push(Box::new(advisor));
        }

        Self::with_providers(remote)
    }

    /// Use the given tiers in order, followed by the rule engine.
    pub fn with_providers(mut providers: Vec<Box<dyn AdviceProvider>>) -> Self {
        providers.push(Box::new(RuleEngine));
        Self { providers }
    }

    pub fn tiers(&self) -> Vec<AdvisorId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Advice for `report`, from the first tier that answers.
    ///
    /// Tiers run one at a time. Dropping the returned future abandons the
    /// in-flight call and skips the remaining tiers.
    pub async fn analyze(&self, report: &str, user_query: &str) -> String {
        let request = AnalysisRequest::new(report, user_query);

        for provider in &self.providers {
            let id = provider.id();
            debug!(advisor = %id, "Trying advice provider");

            match provider.try_analyze(&request).await {
                Ok(advice) => {
                    info!(advisor = %id, "Advice produced");
                    return advice;
                }
                Err(miss @ (ProviderMiss::Unreachable(_) | ProviderMiss::Empty)) => {
                    debug!(advisor = %id, reason = %miss, "Advice provider skipped");
                }
                Err(miss) => {
                    warn!(advisor = %id, reason = %miss, "Advice provider failed; falling back");
                }
            }
        }

        RuleEngine.advise(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdviceConfig, HuggingFaceConfig, OllamaConfig, OpenAiConfig};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    const REPORT: &str = "Current Weather for London, GB:\n\
                          🌡️ Temperature: 5°C (feels like 2°C)\n\
                          🌤️ Conditions: Light Rain\n\
                          💧 Humidity: 85%\n\
                          💨 Wind Speed: 12 m/s\n\
                          🔽 Pressure: 1008 hPa\n\
                          👁️ Visibility: 2500 meters";

    #[derive(Debug)]
    struct Scripted {
        id: AdvisorId,
        answer: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn boxed(id: AdvisorId, answer: Option<&'static str>, calls: &Arc<AtomicUsize>) -> Box<dyn AdviceProvider> {
            Box::new(Self { id, answer, calls: Arc::clone(calls) })
        }
    }

    #[async_trait]
    impl AdviceProvider for Scripted {
        fn id(&self) -> AdvisorId {
            self.id
        }

        async fn try_analyze(&self, _request: &AnalysisRequest) -> Result<String, ProviderMiss> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Some(text) => non_empty(Some(text.to_string())),
                None => Err(ProviderMiss::Status(503)),
            }
        }
    }

    /// Never answers within any reasonable test deadline.
    #[derive(Debug)]
    struct Stalled {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AdviceProvider for Stalled {
        fn id(&self) -> AdvisorId {
            AdvisorId::OpenAi
        }

        async fn try_analyze(&self, _request: &AnalysisRequest) -> Result<String, ProviderMiss> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(ProviderMiss::Timeout)
        }
    }

    fn unconfigured() -> AdviceConfig {
        AdviceConfig {
            openai: OpenAiConfig::default(),
            huggingface: HuggingFaceConfig::default(),
            ollama: OllamaConfig { host: String::new(), ..OllamaConfig::default() },
        }
    }

    #[tokio::test]
    async fn unconfigured_cascade_is_the_rule_engine() {
        let cascade = AnalysisCascade::from_config(&unconfigured());
        assert_eq!(cascade.tiers(), [AdvisorId::Rules]);

        let advice = cascade.analyze(REPORT, "What should I wear?").await;
        let expected = rules::render(&rules::analyze(REPORT, "What should I wear?"));
        assert_eq!(advice, expected);
    }

    #[tokio::test]
    async fn configured_tiers_follow_priority_order() {
        let mut config = unconfigured();
        config.openai.api_key = Some("sk".into());
        config.huggingface.api_token = Some("hf".into());
        config.ollama.host = "http://localhost:11434".into();

        let cascade = AnalysisCascade::from_config(&config);
        assert_eq!(cascade.tiers(), AdvisorId::all());
    }

    #[tokio::test]
    async fn first_answer_wins_and_later_tiers_are_not_called() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let cascade = AnalysisCascade::with_providers(vec![
            Scripted::boxed(AdvisorId::OpenAi, Some("  Bring an umbrella.  "), &first),
            Scripted::boxed(AdvisorId::HuggingFace, Some("unused"), &second),
        ]);

        assert_eq!(cascade.analyze(REPORT, "q").await, "Bring an umbrella.");
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn misses_and_blank_answers_fall_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cascade = AnalysisCascade::with_providers(vec![
            Scripted::boxed(AdvisorId::OpenAi, None, &calls),
            Scripted::boxed(AdvisorId::HuggingFace, Some("   "), &calls),
            Scripted::boxed(AdvisorId::Ollama, Some("Local advice."), &calls),
        ]);

        assert_eq!(cascade.analyze(REPORT, "q").await, "Local advice.");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn all_misses_end_at_rules() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cascade = AnalysisCascade::with_providers(vec![
            Scripted::boxed(AdvisorId::OpenAi, None, &calls),
            Scripted::boxed(AdvisorId::Ollama, None, &calls),
        ]);

        let advice = cascade.analyze(REPORT, "q").await;
        assert!(advice.starts_with("🧥 Chilly."));
        assert!(advice.ends_with("ℹ️ Conditions: Light rain."));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dropped_cascade_abandons_remaining_tiers() {
        let stalled = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let cascade = AnalysisCascade::with_providers(vec![
            Box::new(Stalled { calls: Arc::clone(&stalled) }) as Box<dyn AdviceProvider>,
            Scripted::boxed(AdvisorId::HuggingFace, Some("too late"), &second),
        ]);

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), cascade.analyze(REPORT, "q")).await;

        assert!(outcome.is_err());
        assert_eq!(stalled.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn user_message_layout() {
        let request = AnalysisRequest::new("REPORT", "Do I need a coat?");
        assert_eq!(request.user_message(), "Weather report:\nREPORT\n\nUser question: Do I need a coat?");

        let messages = request.chat_messages();
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty(Some(" hi \n".into())).unwrap(), "hi");
        assert!(matches!(non_empty(Some("\n".into())), Err(ProviderMiss::Empty)));
        assert!(matches!(non_empty(None), Err(ProviderMiss::Empty)));
    }
}
