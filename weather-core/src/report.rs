//! Canonical text rendering of weather reports.
//!
//! The line labels and their order are parsed back by
//! [`crate::advice::parse`] and quoted verbatim into every advice prompt.
//! Change them together or not at all.

use crate::model::{Forecast, WeatherReport};

pub const TEMPERATURE_LABEL: &str = "Temperature:";
pub const FEELS_LIKE_LABEL: &str = "feels like";
pub const CONDITIONS_LABEL: &str = "Conditions:";
pub const HUMIDITY_LABEL: &str = "Humidity:";
pub const WIND_SPEED_LABEL: &str = "Wind Speed:";
pub const PRESSURE_LABEL: &str = "Pressure:";
pub const VISIBILITY_LABEL: &str = "Visibility:";

impl WeatherReport {
    pub fn render(&self) -> String {
        let unit = self.units.temperature_symbol();
        let visibility = self
            .visibility_meters
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "Current Weather for {location}:\n\
             🌡️ {TEMPERATURE_LABEL} {temp}{unit} ({FEELS_LIKE_LABEL} {feels}{unit})\n\
             🌤️ {CONDITIONS_LABEL} {conditions}\n\
             💧 {HUMIDITY_LABEL} {humidity}%\n\
             💨 {WIND_SPEED_LABEL} {wind} {wind_unit}\n\
             🔽 {PRESSURE_LABEL} {pressure} hPa\n\
             👁️ {VISIBILITY_LABEL} {visibility} meters",
            location = self.location,
            temp = self.temperature,
            feels = self.feels_like,
            conditions = title_case(&self.description),
            humidity = self.humidity_pct,
            wind = self.wind_speed,
            wind_unit = self.units.wind_speed_unit(),
            pressure = self.pressure_hpa,
        )
    }
}

impl Forecast {
    pub fn render(&self) -> String {
        let unit = self.units.temperature_symbol();
        let days: String = self
            .days
            .iter()
            .map(|day| {
                format!(
                    "📅 {}: {}{unit}, {}, {HUMIDITY_LABEL} {}%\n",
                    day.date,
                    day.temperature,
                    title_case(&day.description),
                    day.humidity_pct,
                )
            })
            .collect();

        format!("5-Day Weather Forecast for {}:\n\n{days}", self.location)
    }
}

/// Upper-case every letter that follows a non-letter, lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }

    out
}
