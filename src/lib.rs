//! spicesharp-mcp-server library root.
//!
//! Exposes the core JSON-RPC/MCP plumbing, the `SimulationBackend` trait and
//! its stub implementation, the tool handlers, and the networking layer
//! (port allocation, UDP discovery) shared between the `mcp-server` and
//! `mcp-proxy` binaries.

pub mod backend;
pub mod core;
pub mod net;
pub mod tools;
