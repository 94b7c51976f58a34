use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::Units;

pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_HF_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_HF_MODEL: &str = "HuggingFaceH4/zephyr-7b-beta";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";

/// Upstream weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// The only credential the server cannot run tool calls without.
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_units: Units,
    pub default_location: Option<String>,
    pub favorite_locations: Vec<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            default_units: Units::default(),
            default_location: None,
            favorite_locations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    pub api_token: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            model: DEFAULT_HF_MODEL.to_string(),
            base_url: DEFAULT_HF_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// An empty host disables the local tier.
    pub host: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { host: DEFAULT_OLLAMA_HOST.to_string(), model: DEFAULT_OLLAMA_MODEL.to_string() }
    }
}

/// Settings for the advice providers tried before the rule engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceConfig {
    pub openai: OpenAiConfig,
    pub huggingface: HuggingFaceConfig,
    pub ollama: OllamaConfig,
}

/// Process-wide configuration, built once at startup and read-only afterwards.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
/// default_units = "imperial"
/// favorite_locations = ["London, UK", "Tokyo, JP"]
///
/// [advice.ollama]
/// host = ""
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherConfig,
    pub advice: AdviceConfig,
}

impl Config {
    /// Load the config file (if any), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-mcp", "weather-mcp")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override fields from environment-style variables. `lookup` is
    /// `std::env::var` in production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        if let Some(key) = non_blank("OPENWEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }
        if let Some(url) = non_blank("OPENWEATHER_BASE_URL") {
            self.weather.base_url = url;
        }
        if let Some(units) = non_blank("DEFAULT_UNITS") {
            self.weather.default_units =
                units.parse().with_context(|| format!("Invalid DEFAULT_UNITS '{units}'"))?;
        }
        if let Some(location) = non_blank("DEFAULT_LOCATION") {
            self.weather.default_location = Some(location);
        }
        if let Some(raw) = non_blank("FAVORITE_LOCATIONS") {
            self.weather.favorite_locations = parse_favorites(&raw);
        }

        if let Some(key) = non_blank("OPENAI_API_KEY") {
            self.advice.openai.api_key = Some(key);
        }
        if let Some(model) = non_blank("OPENAI_MODEL") {
            self.advice.openai.model = model;
        }
        if let Some(url) = non_blank("OPENAI_BASE_URL") {
            self.advice.openai.base_url = url;
        }

        if let Some(token) = non_blank("HF_API_TOKEN") {
            self.advice.huggingface.api_token = Some(token);
        }
        if let Some(model) = non_blank("HF_MODEL") {
            self.advice.huggingface.model = model;
        }
        if let Some(url) = non_blank("HF_BASE_URL") {
            self.advice.huggingface.base_url = url;
        }

        // Blank is meaningful here: it switches the local tier off.
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.advice.ollama.host = host.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = non_blank("OLLAMA_MODEL") {
            self.advice.ollama.model = model;
        }

        Ok(())
    }

    /// Returns the weather provider API key, if present.
    pub fn weather_api_key(&self) -> Option<&str> {
        self.weather.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Pick the location for a command: explicit, then default, then first favorite.
    pub fn resolve_location(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .or_else(|| self.weather.default_location.clone())
            .or_else(|| self.weather.favorite_locations.first().cloned())
    }
}

fn parse_favorites(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
