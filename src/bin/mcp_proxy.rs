/// StdioProxy (C8): a separate process bridging stdio JSON-RPC to an HTTP
/// JSON-RPC server. Reads stdin line by line, classifies each line as a
/// notification (no `id`) or a request, and relays it to the server's
/// `/mcp` endpoint.
use std::time::Duration;

use serde_json::Value;
use spicesharp_mcp_server::net::discovery::DiscoveryReply;

const DISCOVERY_PORT_RANGE: std::ops::RangeInclusive<u16> = 8081..=8090;
const DISCOVERY_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let Some(target) = args.next() else {
        eprintln!("usage: mcp-proxy <http[s]://host:port/mcp | auto | --discover>");
        std::process::exit(1);
    };

    let endpoint = if target == "auto" || target == "--discover" {
        match discover().await {
            Some(reply) => reply.mcp_endpoint,
            None => {
                eprintln!("mcp-proxy: no MCP server found via discovery");
                std::process::exit(1);
            }
        }
    } else if target.starts_with("http://") || target.starts_with("https://") {
        target
    } else {
        eprintln!("mcp-proxy: invalid endpoint '{target}', expected http[s]://host:port/mcp");
        std::process::exit(1);
    };

    eprintln!("mcp-proxy: relaying stdio to {endpoint}");

    if let Err(e) = run(endpoint).await {
        eprintln!("mcp-proxy: fatal error: {e}");
        std::process::exit(1);
    }
}

/// Probes `127.0.0.1:{p}` for `p` in the default server port range and
/// picks the instance with the highest `processId`, tie-broken by the
/// latest `startTime`.
async fn discover() -> Option<DiscoveryReply> {
    let client = reqwest::Client::builder()
        .timeout(DISCOVERY_PROBE_TIMEOUT)
        .build()
        .ok()?;

    let mut best: Option<DiscoveryReply> = None;
    for port in DISCOVERY_PORT_RANGE {
        let url = format!("http://127.0.0.1:{port}/discovery");
        let Ok(response) = client.get(&url).send().await else {
            continue;
        };
        if !response.status().is_success() {
            continue;
        }
        let Ok(reply) = response.json::<DiscoveryReply>().await else {
            continue;
        };
        best = Some(match best {
            None => reply,
            Some(current) => pick_later(current, reply),
        });
    }
    best
}

fn pick_later(a: DiscoveryReply, b: DiscoveryReply) -> DiscoveryReply {
    match b.process_id.cmp(&a.process_id) {
        std::cmp::Ordering::Greater => b,
        std::cmp::Ordering::Less => a,
        std::cmp::Ordering::Equal => {
            if b.start_time > a.start_time {
                b
            } else {
                a
            }
        }
    }
}

async fn run(endpoint: String) -> std::io::Result<()> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

    let client = reqwest::Client::new();
    let mut lines = BufReader::with_capacity(8192, tokio::io::stdin()).lines();
    let mut stdout = BufWriter::with_capacity(8192, tokio::io::stdout());

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let parsed: Option<Value> = serde_json::from_str(&line).ok();
        let has_id = parsed
            .as_ref()
            .map(|v| v.get("id").is_some())
            .unwrap_or(true);
        let id = parsed.as_ref().and_then(|v| v.get("id").cloned());

        if !has_id {
            let client = client.clone();
            let endpoint = endpoint.clone();
            let line = line.clone();
            tokio::spawn(async move {
                let _ = client
                    .post(&endpoint)
                    .timeout(NOTIFICATION_TIMEOUT)
                    .header("content-type", "application/json")
                    .body(line)
                    .send()
                    .await;
            });
            continue;
        }

        let response = client
            .post(&endpoint)
            .timeout(REQUEST_TIMEOUT)
            .header("content-type", "application/json")
            .body(line)
            .send()
            .await;

        let body = match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(text) => text,
                Err(e) => synthesize_error(id, -32603, &e.to_string()),
            },
            Ok(resp) if resp.status() == reqwest::StatusCode::BAD_REQUEST => {
                synthesize_error(id, -32600, "server rejected the request as malformed")
            }
            Ok(resp) => synthesize_error(
                id,
                -32603,
                &format!("server returned HTTP {}", resp.status()),
            ),
            Err(e) => synthesize_error(id, -32603, &e.to_string()),
        };

        stdout.write_all(body.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}

fn synthesize_error(id: Option<Value>, code: i32, message: &str) -> String {
    serde_json::to_string(&serde_json::json!({
        "jsonrpc": "2.0",
        "id": id.unwrap_or(Value::Null),
        "error": {
            "code": code,
            "message": message,
        }
    }))
    .unwrap_or_else(|_| "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32603,\"message\":\"internal error\"}}".to_string())
}
