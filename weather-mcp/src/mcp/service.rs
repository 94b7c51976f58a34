//! Routes MCP requests to the weather provider and shapes the responses.
//!
//! Weather failures never become protocol errors: they come back as a
//! tool result whose single text block describes the problem.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};
use weather_core::{Config, WeatherError, WeatherProvider, provider_from_config};

use super::jsonrpc::{
    INVALID_PARAMS, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, SERVER_NOT_INITIALIZED,
};
use super::schema::{
    InitializeParams, InitializeResult, ReadResourceParams, ResourceContents, ResourceDescriptor,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolDefinition, ToolResponse,
};
use super::tools::{WeatherTool, WeatherToolArgs};

pub const SERVER_NAME: &str = "weather-server";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const CURRENT_WEATHER_URI: &str = "weather://current";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Ready,
}

/// Protocol-level failures, answered with a JSON-RPC error object.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Server not initialized")]
    NotInitialized,

    #[error("Unknown method: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),
}

impl ServiceError {
    pub fn code(&self) -> i32 {
        match self {
            ServiceError::NotInitialized => SERVER_NOT_INITIALIZED,
            ServiceError::MethodNotFound(_) => METHOD_NOT_FOUND,
            ServiceError::InvalidParams(_) | ServiceError::UnknownResource(_) => INVALID_PARAMS,
        }
    }
}

#[derive(Debug)]
pub struct ToolService {
    config: Arc<Config>,
    /// `None` when no API key is configured; every tool call then reports it.
    provider: Option<Box<dyn WeatherProvider>>,
    state: ServiceState,
}

impl ToolService {
    pub fn new(config: Arc<Config>) -> Self {
        let provider = match provider_from_config(&config) {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!("Weather tools will report an error on every call: {e}");
                None
            }
        };

        Self { config, provider, state: ServiceState::Uninitialized }
    }

    pub fn with_provider(config: Arc<Config>, provider: Box<dyn WeatherProvider>) -> Self {
        Self { config, provider: Some(provider), state: ServiceState::Uninitialized }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Handle one request. Notifications get `None`.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let start = Instant::now();
        debug!(method = %request.method, id = ?request.id, "Received MCP request");

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let response = match self.process(&request).await {
            Ok(result) => JsonRpcResponse::success(request.id.clone(), result),
            Err(e) => {
                warn!(method = %request.method, id = ?request.id, "MCP request failed: {e}");
                JsonRpcResponse::error(request.id.clone(), e.code(), e.to_string())
            }
        };

        debug!(
            method = %request.method,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Completed MCP request"
        );
        Some(response)
    }

    async fn process(&mut self, request: &JsonRpcRequest) -> Result<Value, ServiceError> {
        match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams = parse_params_or_default(&request.params)?;
                Ok(to_value(&self.initialize(params)))
            }
            "ping" => Ok(json!({})),
            _ if self.state != ServiceState::Ready => Err(ServiceError::NotInitialized),
            "resources/list" => Ok(json!({ "resources": Self::list_resources() })),
            "resources/read" => {
                let params: ReadResourceParams = parse_params(&request.params)?;
                let contents = Self::read_resource(&params.uri)?;
                Ok(json!({ "contents": [contents] }))
            }
            "tools/list" => Ok(json!({ "tools": self.list_tools() })),
            "tools/call" => {
                let params: ToolCallParams = parse_params(&request.params)?;
                Ok(to_value(&self.call_tool(&params.name, params.arguments).await))
            }
            other => Err(ServiceError::MethodNotFound(other.to_string())),
        }
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => debug!("Client finished initialization"),
            "notifications/cancelled" => debug!("Client cancelled a request"),
            other => debug!("Ignoring notification: {other}"),
        }
    }

    fn initialize(&mut self, params: InitializeParams) -> InitializeResult {
        let protocol_version = params
            .protocol_version
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

        self.state = ServiceState::Ready;
        info!(protocol_version = %protocol_version, "MCP session initialized");

        InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn list_resources() -> Vec<ResourceDescriptor> {
        vec![ResourceDescriptor {
            uri: CURRENT_WEATHER_URI.to_string(),
            name: "Current Weather".to_string(),
            description: "Get current weather for any location".to_string(),
            mime_type: "application/json".to_string(),
        }]
    }

    pub fn read_resource(uri: &str) -> Result<ResourceContents, ServiceError> {
        if uri != CURRENT_WEATHER_URI {
            return Err(ServiceError::UnknownResource(uri.to_string()));
        }

        let hint = json!({
            "description": "Current weather resource",
            "usage": "Use the get_weather tool to fetch current weather data",
            "example": "get_weather(location='New York')",
        });

        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: "application/json".to_string(),
            text: hint.to_string(),
        })
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let units = self.config.weather.default_units;
        WeatherTool::all().iter().map(|tool| tool.definition(units)).collect()
    }

    /// Run a tool. Every failure is reported inside the returned result.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> ToolResponse {
        let tool = match WeatherTool::try_from(name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = name, "Call to unknown tool");
                return ToolResponse::error(e.to_string());
            }
        };

        let query = match WeatherToolArgs::from_value(arguments) {
            Ok(args) => args.into_query(self.config.weather.default_units),
            Err(e) => {
                return ToolResponse::error(format!(
                    "Error: invalid arguments for {}: {e}",
                    tool.name()
                ));
            }
        };

        let kind = tool.report_kind();
        let Some(provider) = self.provider.as_deref() else {
            return ToolResponse::error(WeatherError::missing_api_key().user_message(kind));
        };

        info!(tool = tool.name(), location = %query.name, units = %query.units, "Calling tool");

        let rendered = match tool {
            WeatherTool::GetWeather => provider.current(&query).await.map(|r| r.render()),
            WeatherTool::GetForecast => provider.forecast(&query).await.map(|f| f.render()),
        };

        match rendered {
            Ok(text) => ToolResponse::text(text),
            Err(e) => {
                warn!(tool = tool.name(), location = %query.name, "Weather lookup failed: {e}");
                ToolResponse::error(e.user_message(kind))
            }
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: &Option<Value>) -> Result<T, ServiceError> {
    let value = params
        .clone()
        .ok_or_else(|| ServiceError::InvalidParams("missing params".to_string()))?;
    serde_json::from_value(value).map_err(|e| ServiceError::InvalidParams(e.to_string()))
}

fn parse_params_or_default<T: DeserializeOwned + Default>(
    params: &Option<Value>,
) -> Result<T, ServiceError> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(_) => parse_params(params),
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    // Plain structs of strings and bools always serialize.
    serde_json::to_value(value).unwrap_or(Value::Null)
}
