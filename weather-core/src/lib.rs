//! Core library for the weather MCP server.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider abstraction and its OpenWeather implementation
//! - Canonical report rendering and forecast reduction
//! - The advice cascade (language-model tiers + rule engine)
//!
//! It is used by `weather-mcp`, but can also be reused by other binaries or services.

pub mod advice;
pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod report;

pub use advice::{AdviceProvider, AdvisorId, AnalysisCascade, AnalysisRequest};
pub use config::{AdviceConfig, Config, WeatherConfig};
pub use error::{ReportKind, WeatherError};
pub use model::{Forecast, ForecastDay, LocationQuery, Units, WeatherReport};
pub use provider::{WeatherProvider, provider_from_config};
