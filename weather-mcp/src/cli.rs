use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tokio::io::{BufReader, stdin, stdout};
use tracing::{info, warn};
use weather_core::{
    AnalysisCascade, Config, LocationQuery, ReportKind, Units, WeatherProvider, provider_from_config,
};
use weather_mcp::mcp::{ToolService, serve};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-mcp", version, about = "Weather tools over the Model Context Protocol")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve MCP requests on stdin/stdout until input closes.
    Serve,

    /// Print the tool definitions advertised by `tools/list`.
    Tools,

    /// Show current weather.
    Current {
        /// City name, optionally with state/country. Falls back to the configured default.
        location: Option<String>,

        #[arg(long, value_enum)]
        units: Option<UnitsArg>,
    },

    /// Show the 5-day forecast.
    Forecast {
        location: Option<String>,

        #[arg(long, value_enum)]
        units: Option<UnitsArg>,
    },

    /// Fetch current weather and ask for practical advice about it.
    Advise {
        location: Option<String>,

        /// Question to ask about the weather.
        #[arg(long, short)]
        query: Option<String>,

        #[arg(long, value_enum)]
        units: Option<UnitsArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitsArg {
    Metric,
    Imperial,
    Kelvin,
}

impl From<UnitsArg> for Units {
    fn from(value: UnitsArg) -> Self {
        match value {
            UnitsArg::Metric => Units::Metric,
            UnitsArg::Imperial => Units::Imperial,
            UnitsArg::Kelvin => Units::Kelvin,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Serve => run_server(config).await,
            Command::Tools => {
                let service = ToolService::new(Arc::new(config));
                let tools = serde_json::json!({ "tools": service.list_tools() });
                println!("{}", serde_json::to_string_pretty(&tools)?);
                Ok(())
            }
            Command::Current { location, units } => {
                let query = resolve_query(&config, location.as_deref(), units)?;
                let provider = weather_provider(&config, ReportKind::Current)?;
                let report = provider
                    .current(&query)
                    .await
                    .map_err(|e| anyhow!(e.user_message(ReportKind::Current)))?;
                println!("{}", report.render());
                Ok(())
            }
            Command::Forecast { location, units } => {
                let query = resolve_query(&config, location.as_deref(), units)?;
                let provider = weather_provider(&config, ReportKind::Forecast)?;
                let forecast = provider
                    .forecast(&query)
                    .await
                    .map_err(|e| anyhow!(e.user_message(ReportKind::Forecast)))?;
                print!("{}", forecast.render());
                Ok(())
            }
            Command::Advise { location, query, units } => {
                let location_query = resolve_query(&config, location.as_deref(), units)?;
                let question =
                    query.unwrap_or_else(|| format!("Weather for {}", location_query.name));

                tokio::select! {
                    result = advise(&config, &location_query, &question) => result,
                    _ = tokio::signal::ctrl_c() => {
                        warn!("Interrupted, abandoning advice request");
                        Ok(())
                    }
                }
            }
        }
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let mut service = ToolService::new(Arc::new(config));
    let reader = BufReader::new(stdin());

    tokio::select! {
        result = serve(&mut service, reader, stdout()) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    }
}

async fn advise(config: &Config, query: &LocationQuery, question: &str) -> anyhow::Result<()> {
    let provider = weather_provider(config, ReportKind::Current)?;
    let report = provider
        .current(query)
        .await
        .map_err(|e| anyhow!(e.user_message(ReportKind::Current)))?
        .render();

    let cascade = AnalysisCascade::from_config(&config.advice);
    info!(tiers = ?cascade.tiers(), "Running advice cascade");
    let advice = cascade.analyze(&report, question).await;

    println!("{report}\n\n{advice}");
    Ok(())
}

fn resolve_query(
    config: &Config,
    location: Option<&str>,
    units: Option<UnitsArg>,
) -> anyhow::Result<LocationQuery> {
    let name = config.resolve_location(location).context(
        "No location given. Pass one, or set DEFAULT_LOCATION or FAVORITE_LOCATIONS",
    )?;
    let units = units.map(Units::from).unwrap_or(config.weather.default_units);
    Ok(LocationQuery::new(name, units))
}

fn weather_provider(config: &Config, kind: ReportKind) -> anyhow::Result<Box<dyn WeatherProvider>> {
    provider_from_config(config).map_err(|e| anyhow!(e.user_message(kind)))
}
