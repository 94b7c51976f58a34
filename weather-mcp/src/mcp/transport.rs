//! Newline-delimited JSON-RPC over a pair of byte streams.
//!
//! Stdout belongs to the protocol. Diagnostics go through `tracing`, which
//! the binary points at stderr.

use anyhow::Context;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::jsonrpc::{INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use super::service::ToolService;

/// Serve requests from `reader` until it reaches end of input.
///
/// Every response is written as a single line and flushed immediately.
/// Requests are handled one at a time, in arrival order.
pub async fn serve<R, W>(service: &mut ToolService, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    info!("MCP server listening on stdio");

    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(response) = handle_line(service, line).await {
            write_response(&mut writer, &response).await?;
        }
    }

    info!("Input closed, shutting down");
    Ok(())
}

async fn handle_line(service: &mut ToolService, line: &str) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unparseable message: {e}");
            return Some(JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}")));
        }
    };

    // Keep the id so a malformed request still gets a correlated answer.
    let id = value.get("id").cloned();

    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) => service.handle_request(request).await,
        Err(e) => {
            warn!("Invalid request: {e}");
            Some(JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {e}")))
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> anyhow::Result<()> {
    let mut payload = serde_json::to_vec(response).context("Failed to serialize response")?;
    payload.push(b'\n');

    writer.write_all(&payload).await.context("Failed to write response")?;
    writer.flush().await.context("Failed to flush response")?;
    debug!(bytes = payload.len(), "Sent response");
    Ok(())
}
