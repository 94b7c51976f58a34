use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::WeatherError,
    forecast::{RawForecastEntry, reduce},
    model::{Forecast, LocationQuery, WeatherReport},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &LocationQuery,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let mut params = vec![("q", query.name.as_str()), ("appid", self.api_key.as_str())];
        if let Some(units) = query.units.api_param() {
            params.push(("units", units));
        }

        debug!(endpoint, location = %query.name, units = %query.units, "Requesting OpenWeather");

        let res = self.http.get(&url).query(&params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound { location: query.name.clone() });
        }

        if !status.is_success() {
            return Err(WeatherError::Upstream { status: status.as_u16(), body });
        }

        serde_json::from_str(&body)
            .map_err(|e| WeatherError::Malformed(format!("OpenWeather {endpoint} JSON: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: Option<i64>,
    dt_txt: Option<String>,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

impl OwForecastEntry {
    fn into_raw(self) -> Result<RawForecastEntry, WeatherError> {
        let timestamp = match (self.dt_txt, self.dt) {
            (Some(txt), _) => txt,
            (None, Some(dt)) => DateTime::from_timestamp(dt, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .ok_or_else(|| {
                    WeatherError::Malformed(format!("forecast timestamp {dt} out of range"))
                })?,
            (None, None) => {
                return Err(WeatherError::Malformed(
                    "forecast entry has neither dt_txt nor dt".to_string(),
                ));
            }
        };

        Ok(RawForecastEntry {
            timestamp,
            temperature: self.main.temp,
            description: first_description(&self.weather),
            humidity_pct: self.main.humidity,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, query: &LocationQuery) -> Result<WeatherReport, WeatherError> {
        let parsed: OwCurrentResponse = self.get_json("weather", query).await?;

        Ok(WeatherReport {
            location: display_location(&parsed.name, parsed.sys.country.as_deref()),
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            description: first_description(&parsed.weather),
            humidity_pct: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            pressure_hpa: parsed.main.pressure,
            visibility_meters: parsed.visibility,
            units: query.units,
        })
    }

    async fn forecast(&self, query: &LocationQuery) -> Result<Forecast, WeatherError> {
        let parsed: OwForecastResponse = self.get_json("forecast", query).await?;

        let raw = parsed
            .list
            .into_iter()
            .map(OwForecastEntry::into_raw)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Forecast {
            location: display_location(&parsed.city.name, parsed.city.country.as_deref()),
            units: query.units,
            days: reduce(&raw),
        })
    }
}

fn display_location(name: &str, country: Option<&str>) -> String {
    match country.filter(|c| !c.is_empty()) {
        Some(country) => format!("{name}, {country}"),
        None => name.to_string(),
    }
}

fn first_description(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}
