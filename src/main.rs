/// MCP Server Entry Point
///
/// Parses `Config` from CLI flags/environment, builds the tool registry and
/// a `StubBackend`, then runs either the stdio transport (a line-oriented
/// JSON-RPC loop for MCP Inspector-style tooling) or the HTTP transport (an
/// axum server plus the UDP discovery broadcaster), depending on
/// `--transport`.
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use spicesharp_mcp_server::backend::StubBackend;
use spicesharp_mcp_server::core::cache::ResultsCache;
use spicesharp_mcp_server::core::config::{Config, TransportMode};
use spicesharp_mcp_server::core::context::AppContext;
use spicesharp_mcp_server::core::log_buffer::LogBuffer;
use spicesharp_mcp_server::core::server;
use spicesharp_mcp_server::net::{broadcaster, port_allocator};
use spicesharp_mcp_server::tools;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let backend: Arc<dyn spicesharp_mcp_server::backend::SimulationBackend> = Arc::new(StubBackend::new());
    let (registry, dispatcher) = tools::build();
    let log = Arc::new(LogBuffer::new(config.log_capacity));

    let transport = config.transport;
    let context = Arc::new(AppContext::new(
        config,
        Arc::new(ResultsCache::new()),
        backend,
        log,
        Arc::new(registry),
        Arc::new(dispatcher),
    ));

    match transport {
        TransportMode::Stdio => server::run_stdio(context).await,
        TransportMode::Http => run_http(context).await,
    }
}

async fn run_http(context: Arc<AppContext>) -> std::io::Result<()> {
    let port = port_allocator::find(context.config.port_start, context.config.port_tries)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, e.to_string()))?;
    context.set_bound_port(port);

    let bind_host = if context.config.network_visible {
        "0.0.0.0"
    } else {
        "127.0.0.1"
    };
    let listener = tokio::net::TcpListener::bind((bind_host, port)).await?;

    eprintln!(
        "{} v{} listening on http://{bind_host}:{port}/mcp",
        context.config.server_name, context.config.server_version
    );

    port_allocator::verify_listening(port, &context.log).await;

    let cancel = CancellationToken::new();
    let discovery_handle = if context.config.discovery_disabled {
        None
    } else {
        let discovery_context = context.clone();
        let discovery_cancel = cancel.clone();
        Some(tokio::spawn(broadcaster::run(discovery_context, discovery_cancel)))
    };

    let router = server::router(context.clone());
    let shutdown_cancel = cancel.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown_cancel.cancel();
        })
        .await?;

    if let Some(handle) = discovery_handle {
        cancel.cancel();
        let _ = handle.await;
    }

    Ok(())
}
