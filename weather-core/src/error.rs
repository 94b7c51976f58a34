use thiserror::Error;

/// Which report a failed fetch was producing. Only changes the wording of
/// upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Current,
    Forecast,
}

impl ReportKind {
    fn noun(&self) -> &'static str {
        match self {
            ReportKind::Current => "weather",
            ReportKind::Forecast => "forecast",
        }
    }
}

/// Failures of the weather fetcher.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{0}")]
    Config(String),

    #[error("Location '{location}' not found. Please check the spelling and try again.")]
    NotFound { location: String },

    #[error("upstream request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("request to weather provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed weather provider payload: {0}")]
    Malformed(String),
}

impl WeatherError {
    pub fn missing_api_key() -> Self {
        WeatherError::Config("OPENWEATHER_API_KEY environment variable not set".to_string())
    }

    /// Text placed into a tool result when a fetch fails.
    pub fn user_message(&self, kind: ReportKind) -> String {
        match self {
            WeatherError::Upstream { status, body } => {
                format!("Error fetching {} data: {status} - {body}", kind.noun())
            }
            other => format!("Error: {other}"),
        }
    }
}
