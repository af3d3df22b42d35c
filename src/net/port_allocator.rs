/// PortAllocator (C4): finds and verifies a free TCP port in a bounded
/// range, and verifies the server actually came up on it afterward.
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use crate::core::log_buffer::LogBuffer;

#[derive(thiserror::Error, Debug)]
pub enum PortError {
    #[error("no free port found in [{start}, {end})")]
    NoFreePort { start: u16, end: u16 },
}

/// A port is available iff binding a listener on `0.0.0.0:port` succeeds
/// *and* a loopback connect to the same port with a short timeout fails
/// (nothing is already listening there under a different interface). The
/// listener is dropped before returning.
fn is_available(port: u16) -> bool {
    match TcpListener::bind(("0.0.0.0", port)) {
        Ok(listener) => drop(listener),
        Err(_) => return false,
    };
    TcpStream::connect_timeout(
        &format!("127.0.0.1:{port}").parse().expect("valid socket addr"),
        Duration::from_millis(100),
    )
    .is_err()
}

/// Scans `[start_port, start_port + max_tries)` for the first available
/// port.
pub fn find(start_port: u16, max_tries: u16) -> Result<u16, PortError> {
    for offset in 0..max_tries {
        let port = start_port.saturating_add(offset);
        if is_available(port) {
            return Ok(port);
        }
    }
    Err(PortError::NoFreePort {
        start: start_port,
        end: start_port.saturating_add(max_tries),
    })
}

/// Post-bind verification: five attempts at 200ms intervals to connect to
/// `127.0.0.1:port`. A final failure is logged, not fatal -- discovery and
/// the proxy will still be tried, and a client connecting directly will
/// simply fail loudly if the server truly isn't up.
pub async fn verify_listening(port: u16, log: &LogBuffer) {
    for attempt in 0..5 {
        let addr = format!("127.0.0.1:{port}");
        let ok = tokio::task::spawn_blocking(move || {
            TcpStream::connect_timeout(
                &addr.parse().expect("valid socket addr"),
                Duration::from_millis(200),
            )
            .is_ok()
        })
        .await
        .unwrap_or(false);
        if ok {
            return;
        }
        if attempt < 4 {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
    log.warning(format!(
        "port verification failed: could not connect to 127.0.0.1:{port} after 5 attempts"
    ));
}
