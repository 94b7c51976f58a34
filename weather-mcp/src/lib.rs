//! MCP server and command-line front end for the weather tools.
//!
//! The protocol lives in [`mcp`]; the binary in `main.rs` wires it to
//! stdio and adds a few direct commands for use from a terminal.

pub mod mcp;
