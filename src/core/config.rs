/// Config (C11): startup configuration, sourced from CLI flags or
/// environment variables with documented defaults. Generalizes the
/// teacher's ad hoc `env::var(...).unwrap_or_else(...)` reads in `main.rs`
/// into a single typed, `clap`-parsed struct.
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
#[clap(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Stdio,
    Http,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-server")]
#[command(author, version)]
#[command(about = "MCP service-integration layer for a circuit-simulation backend")]
pub struct Config {
    /// Server name reported in MCP `initialize` responses.
    #[arg(long, env = "SERVER_NAME", default_value = "spicesharp-mcp-server")]
    pub server_name: String,

    /// Server version reported in MCP `initialize` responses.
    #[arg(long, env = "SERVER_VERSION", default_value = "1.0.0")]
    pub server_version: String,

    /// Transport for the main server binary: the bridging StdioProxy talks
    /// to an `http` instance; `stdio` is kept for local/direct-execution
    /// compatibility with MCP Inspector-style tooling.
    #[arg(long = "transport", env = "MCP_TRANSPORT_MODE", value_enum, default_value = "stdio")]
    pub transport: TransportMode,

    /// Bind host for HTTP mode.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// First port `PortAllocator` tries.
    #[arg(long = "port", env = "PORT", default_value_t = 8081)]
    pub port_start: u16,

    /// How many ports to try, starting at `port_start`.
    #[arg(long, env = "PORT_TRIES", default_value_t = 10)]
    pub port_tries: u16,

    /// Whether the server binds `0.0.0.0` (network-visible) or `127.0.0.1`
    /// (loopback-only).
    #[arg(long, env = "MCP_NETWORK_VISIBLE", default_value_t = false)]
    pub network_visible: bool,

    /// Seconds between UDP discovery announcements.
    #[arg(long, env = "MCP_DISCOVERY_INTERVAL_SECS", default_value_t = 30)]
    pub discovery_interval_secs: u64,

    /// UDP port discovery announcements are broadcast to.
    #[arg(long, env = "MCP_DISCOVERY_PORT", default_value_t = 19847)]
    pub discovery_port: u16,

    /// Capacity of the in-memory structured log ring buffer.
    #[arg(long, env = "MCP_LOG_CAPACITY", default_value_t = 1000)]
    pub log_capacity: usize,

    /// Disable the UDP discovery broadcaster (e.g. for CI, sandboxes
    /// without broadcast permission).
    #[arg(long, env = "MCP_DISCOVERY_DISABLED", default_value_t = false)]
    pub discovery_disabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::parse_from(["mcp-server"]);
        assert_eq!(cfg.port_start, 8081);
        assert_eq!(cfg.port_tries, 10);
        assert_eq!(cfg.discovery_interval_secs, 30);
        assert_eq!(cfg.discovery_port, 19847);
        assert_eq!(cfg.log_capacity, 1000);
        assert!(!cfg.network_visible);
        assert_eq!(cfg.transport, TransportMode::Stdio);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Config::parse_from([
            "mcp-server",
            "--transport",
            "http",
            "--port",
            "9000",
            "--network-visible",
        ]);
        assert_eq!(cfg.transport, TransportMode::Http);
        assert_eq!(cfg.port_start, 9000);
        assert!(cfg.network_visible);
    }
}
