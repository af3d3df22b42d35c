/// DiscoveryBroadcaster (C7): periodic UDP broadcast announcing the
/// server's endpoint and tool list. Own long-lived task, own UDP socket,
/// cancelable, guaranteed to release the socket on cancel.
///
/// State machine: Idle -> Broadcasting -> Backoff -> Broadcasting -> ... ->
/// Stopped. Backoff is entered after 5 consecutive send errors; it exits
/// into Broadcasting after one socket recreation, or after one 5s sleep if
/// recreation itself fails.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::core::context::AppContext;
use crate::net::discovery::DiscoveryAnnouncement;

const CONSECUTIVE_FAILURE_THRESHOLD: u32 = 5;
const BACKOFF_SLEEP: Duration = Duration::from_secs(5);

async fn bind_broadcast_socket() -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.set_broadcast(true)?;
    Ok(socket)
}

fn announcement_for(context: &AppContext) -> DiscoveryAnnouncement {
    let tools = context
        .registry
        .list()
        .iter()
        .map(|d| d.name.clone())
        .collect();
    let host = if context.network_visible() {
        local_outbound_ipv4().unwrap_or_else(|| "127.0.0.1".to_string())
    } else {
        "127.0.0.1".to_string()
    };
    DiscoveryAnnouncement::new(
        &context.config.server_name,
        &context.config.server_version,
        &host,
        context.bound_port(),
        tools,
        context.instance_id,
        "default",
    )
}

/// Asks the OS for the address it would use to reach the internet, without
/// sending a packet -- a standard trick for discovering the outbound
/// interface's IPv4 address.
fn local_outbound_ipv4() -> Option<String> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip().to_string())
}

/// Runs until `cancel` is triggered. On return, the UDP socket has already
/// been dropped.
pub async fn run(context: Arc<AppContext>, cancel: CancellationToken) {
    let broadcast_addr: SocketAddr = format!("255.255.255.255:{}", context.config.discovery_port)
        .parse()
        .expect("valid broadcast address");

    let mut socket = match bind_broadcast_socket().await {
        Ok(socket) => socket,
        Err(e) => {
            context
                .log
                .error(format!("discovery broadcaster failed to bind a UDP socket: {e}"));
            return;
        }
    };

    let mut interval = tokio::time::interval(Duration::from_secs(
        context.config.discovery_interval_secs.max(1),
    ));
    let mut consecutive_failures: u32 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                context.log.info("discovery broadcaster cancelled");
                break;
            }
            _ = interval.tick() => {
                let announcement = announcement_for(&context);
                let payload = match serde_json::to_vec(&announcement) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        context.log.error(format!("failed to serialize discovery announcement: {e}"));
                        continue;
                    }
                };

                match socket.send_to(&payload, broadcast_addr).await {
                    Ok(_) => {
                        consecutive_failures = 0;
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        context.log.warning(format!(
                            "discovery broadcast send failed ({consecutive_failures}/{CONSECUTIVE_FAILURE_THRESHOLD}): {e}"
                        ));
                        if consecutive_failures >= CONSECUTIVE_FAILURE_THRESHOLD {
                            match bind_broadcast_socket().await {
                                Ok(fresh) => {
                                    socket = fresh;
                                    consecutive_failures = 0;
                                    context.log.info("discovery broadcaster recreated its UDP socket");
                                }
                                Err(e) => {
                                    context.log.error(format!(
                                        "discovery broadcaster failed to recreate its UDP socket: {e}; sleeping {BACKOFF_SLEEP:?}"
                                    ));
                                    tokio::time::sleep(BACKOFF_SLEEP).await;
                                    consecutive_failures = 0;
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StubBackend;
    use crate::core::cache::ResultsCache;
    use crate::core::config::Config;
    use crate::core::dispatcher::ToolDispatcher;
    use crate::core::log_buffer::LogBuffer;
    use crate::core::registry::ToolRegistry;
    use clap::Parser;

    fn context() -> Arc<AppContext> {
        let config = Config::parse_from(["mcp-server", "--discovery-interval-secs", "60"]);
        let registry = Arc::new(ToolRegistry::new(vec![]).unwrap());
        let dispatcher = Arc::new(ToolDispatcher::new(registry.clone()));
        let ctx = AppContext::new(
            config,
            Arc::new(ResultsCache::new()),
            Arc::new(StubBackend::new()),
            Arc::new(LogBuffer::new(100)),
            registry,
            dispatcher,
        );
        ctx.set_bound_port(8081);
        Arc::new(ctx)
    }

    #[tokio::test]
    async fn run_exits_promptly_on_cancellation() {
        let ctx = context();
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(run(ctx, cancel_clone));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("broadcaster task did not exit after cancellation")
            .expect("broadcaster task panicked");
    }

    #[test]
    fn announcement_reflects_current_config() {
        let ctx = context();
        let announcement = announcement_for(&ctx);
        assert_eq!(announcement.server.transport.port, 8081);
        assert_eq!(announcement.instance.pid, std::process::id());
    }
}
