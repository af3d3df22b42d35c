/// Core module: JSON-RPC/MCP protocol types, the tool registry and
/// dispatcher, shared application state, configuration, structured error
/// type, the analysis results cache, the log ring buffer, and the axum HTTP
/// server.
pub mod cache;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod log_buffer;
pub mod protocol;
pub mod registry;
pub mod server;
