use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::WeatherError;

/// Measurement system requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Kelvin,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Kelvin => "kelvin",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial, Units::Kelvin]
    }

    /// Value of the upstream `units` query parameter. Kelvin is the upstream
    /// default, so it is sent as no parameter at all.
    pub fn api_param(&self) -> Option<&'static str> {
        match self {
            Units::Metric => Some("metric"),
            Units::Imperial => Some("imperial"),
            Units::Kelvin => None,
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Kelvin => "K",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Metric | Units::Kelvin => "m/s",
            Units::Imperial => "mph",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = WeatherError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "kelvin" => Ok(Units::Kelvin),
            _ => Err(WeatherError::Config(format!(
                "Unknown units '{value}'. Supported units: metric, imperial, kelvin."
            ))),
        }
    }
}

/// A location lookup as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    /// Free text, usually "City, Country" or "City, State".
    pub name: String,
    pub units: Units,
}

impl LocationQuery {
    pub fn new(name: impl Into<String>, units: Units) -> Self {
        Self { name: name.into(), units }
    }
}

/// Current conditions for one location, normalized from the upstream payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub description: String,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub pressure_hpa: u32,
    /// `None` when the upstream omits visibility; rendered as `N/A`.
    pub visibility_meters: Option<u32>,
    pub units: Units,
}

/// The representative conditions for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// `YYYY-MM-DD`
    pub date: String,
    pub temperature: f64,
    pub description: String,
    pub humidity_pct: u8,
}

/// Up to five [`ForecastDay`]s for one location, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location: String,
    pub units: Units,
    pub days: Vec<ForecastDay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_table_matches_display_contract() {
        let expected = [
            (Units::Metric, Some("metric"), "°C", "m/s"),
            (Units::Imperial, Some("imperial"), "°F", "mph"),
            (Units::Kelvin, None, "K", "m/s"),
        ];

        for (units, param, symbol, wind) in expected {
            assert_eq!(units.api_param(), param);
            assert_eq!(units.temperature_symbol(), symbol);
            assert_eq!(units.wind_speed_unit(), wind);
        }
        assert_eq!(Units::all().len(), expected.len());
    }

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed: Units = units.as_str().parse().expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unknown_units_error() {
        let err = "rankine".parse::<Units>().unwrap_err();
        assert!(err.to_string().contains("Unknown units 'rankine'"));
    }

    #[test]
    fn units_default_to_metric() {
        assert_eq!(Units::default(), Units::Metric);
    }
}
