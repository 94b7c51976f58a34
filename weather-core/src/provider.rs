use crate::{
    Config, LocationQuery,
    error::WeatherError,
    model::{Forecast, WeatherReport},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current conditions and multi-day forecasts.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, query: &LocationQuery) -> Result<WeatherReport, WeatherError>;

    async fn forecast(&self, query: &LocationQuery) -> Result<Forecast, WeatherError>;
}

/// Construct the weather provider from config.
///
/// Fails with [`WeatherError::Config`] when no API key is configured.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>, WeatherError> {
    let api_key = config.weather_api_key().ok_or_else(WeatherError::missing_api_key)?;

    Ok(Box::new(OpenWeatherProvider::new(
        api_key.to_owned(),
        config.weather.base_url.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(matches!(err, WeatherError::Config(_)));
        assert!(err.to_string().contains("OPENWEATHER_API_KEY"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.weather.api_key = Some("KEY".to_string());

        assert!(provider_from_config(&cfg).is_ok());
    }
}
