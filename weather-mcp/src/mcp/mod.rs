//! Model Context Protocol server exposing the weather tools.

pub mod jsonrpc;
pub mod schema;
pub mod service;
pub mod tools;
pub mod transport;

pub use service::{ServiceState, ToolService};
pub use transport::serve;
