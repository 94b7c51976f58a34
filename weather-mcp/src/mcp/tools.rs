//! The closed set of tools this server exposes.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use weather_core::{LocationQuery, ReportKind, Units};

use super::schema::{JsonSchema, PropertySchema, ToolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherTool {
    GetWeather,
    GetForecast,
}

#[derive(Debug, Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl WeatherTool {
    pub fn name(&self) -> &'static str {
        match self {
            WeatherTool::GetWeather => "get_weather",
            WeatherTool::GetForecast => "get_forecast",
        }
    }

    pub const fn all() -> &'static [WeatherTool] {
        &[WeatherTool::GetWeather, WeatherTool::GetForecast]
    }

    pub fn description(&self) -> &'static str {
        match self {
            WeatherTool::GetWeather => "Get current weather information for a specific location",
            WeatherTool::GetForecast => "Get 5-day weather forecast for a specific location",
        }
    }

    pub fn report_kind(&self) -> ReportKind {
        match self {
            WeatherTool::GetWeather => ReportKind::Current,
            WeatherTool::GetForecast => ReportKind::Forecast,
        }
    }

    /// Schema advertised by `tools/list`. `default_units` is what an omitted
    /// `units` argument resolves to.
    pub fn definition(&self, default_units: Units) -> ToolDefinition {
        let location = PropertySchema::string(
            "City name, state/country (e.g., 'New York, NY' or 'London, UK')",
        );
        let units = PropertySchema::string(
            "Temperature units (metric=Celsius, imperial=Fahrenheit, kelvin=Kelvin)",
        )
        .with_enum(Units::all().iter().map(Units::as_str), default_units.as_str());

        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: JsonSchema {
                schema_type: "object".to_string(),
                properties: BTreeMap::from([
                    ("location".to_string(), location),
                    ("units".to_string(), units),
                ]),
                required: vec!["location".to_string()],
            },
        }
    }
}

impl TryFrom<&str> for WeatherTool {
    type Error = UnknownTool;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        WeatherTool::all()
            .iter()
            .copied()
            .find(|tool| tool.name() == value)
            .ok_or_else(|| UnknownTool(value.to_string()))
    }
}

/// Arguments shared by both tools.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherToolArgs {
    pub location: String,
    #[serde(default)]
    pub units: Option<Units>,
}

impl WeatherToolArgs {
    pub fn from_value(arguments: Option<Value>) -> Result<Self, String> {
        let value = arguments.unwrap_or_else(|| Value::Object(Default::default()));
        let args: Self = serde_json::from_value(value).map_err(|e| e.to_string())?;

        if args.location.trim().is_empty() {
            return Err("location must not be empty".to_string());
        }
        Ok(args)
    }

    pub fn into_query(self, default_units: Units) -> LocationQuery {
        LocationQuery::new(self.location.trim(), self.units.unwrap_or(default_units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_names_roundtrip() {
        for tool in WeatherTool::all() {
            assert_eq!(WeatherTool::try_from(tool.name()).unwrap(), *tool);
        }
    }

    #[test]
    fn unknown_tool_names_the_tool() {
        let err = WeatherTool::try_from("get_humidity").unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: get_humidity");
    }

    #[test]
    fn definition_schema_shape() {
        let value = serde_json::to_value(WeatherTool::GetForecast.definition(Units::Metric)).unwrap();

        assert_eq!(value["name"], "get_forecast");
        assert_eq!(value["inputSchema"]["type"], "object");
        assert_eq!(value["inputSchema"]["required"], json!(["location"]));
        assert_eq!(value["inputSchema"]["properties"]["location"]["type"], "string");
        assert_eq!(
            value["inputSchema"]["properties"]["units"]["enum"],
            json!(["metric", "imperial", "kelvin"])
        );
        assert_eq!(value["inputSchema"]["properties"]["units"]["default"], "metric");
    }

    #[test]
    fn schema_default_follows_configured_units() {
        let def = WeatherTool::GetWeather.definition(Units::Imperial);
        let units = &def.input_schema.properties["units"];
        assert_eq!(units.default, Some(json!("imperial")));
    }

    #[test]
    fn args_default_units() {
        let args = WeatherToolArgs::from_value(Some(json!({"location": " Paris, FR "}))).unwrap();
        let query = args.into_query(Units::Kelvin);
        assert_eq!(query, LocationQuery::new("Paris, FR", Units::Kelvin));
    }

    #[test]
    fn args_validation() {
        assert!(WeatherToolArgs::from_value(None).unwrap_err().contains("location"));
        assert!(WeatherToolArgs::from_value(Some(json!({"location": "  "}))).is_err());
        assert!(
            WeatherToolArgs::from_value(Some(json!({"location": "Oslo", "units": "rankine"})))
                .unwrap_err()
                .contains("rankine")
        );

        let args =
            WeatherToolArgs::from_value(Some(json!({"location": "Oslo", "units": "imperial"}))).unwrap();
        assert_eq!(args.units, Some(Units::Imperial));
    }
}
