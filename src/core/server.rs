/// JsonRpcServer (C5) and DiscoveryEndpoint (C6).
///
/// Generalizes the teacher's actix-web `mcp_handler_optimized` /
/// `run_server_http` pair onto `axum`: same request pipeline (parse, require
/// `jsonrpc == "2.0"`, require a string `method`, route, map errors to a
/// JSON-RPC error body plus an HTTP status), same buffered-stdio loop for
/// direct (non-proxied) stdio operation, same "log startup to stderr, never
/// stdout" discipline.
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::context::AppContext;
use crate::core::dispatcher::DispatchContext;
use crate::core::error::McpError;
use crate::core::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::net::discovery::DiscoveryReply;

const PROTOCOL_VERSION: &str = "2024-11-05";

pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/discovery", get(discovery_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({"status": "ok", "service": "mcp-server"}))
}

async fn discovery_handler(State(context): State<Arc<AppContext>>) -> impl IntoResponse {
    let host = if context.network_visible() {
        local_ipv4().unwrap_or_else(|| "127.0.0.1".to_string())
    } else {
        "127.0.0.1".to_string()
    };
    let port = context.bound_port();
    let reply = DiscoveryReply {
        mcp_endpoint: format!("http://{host}:{port}/mcp"),
        port,
        host,
        network_visible: context.network_visible(),
        process_id: std::process::id(),
        start_time: context.start_time,
    };
    axum::Json(reply)
}

fn local_ipv4() -> Option<String> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip().to_string())
}

async fn mcp_handler(State(context): State<Arc<AppContext>>, body: Bytes) -> Response {
    context.increment_request_count();

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(_) => return error_response(None, &McpError::ParseError),
    };

    if request.jsonrpc.as_deref() != Some("2.0") {
        return error_response(request.id, &McpError::InvalidRequest);
    }
    let Some(method) = request.method.clone() else {
        return error_response(request.id, &McpError::InvalidRequest);
    };

    if request.id.is_none() {
        let dispatch = DispatchContext {
            cache: context.cache.clone(),
            backend: context.backend.clone(),
            log: context.log.clone(),
        };
        if let Err(e) = route(&context, dispatch, &method, request.params).await {
            context
                .log
                .warning(format!("notification '{method}' failed silently: {e}"));
        } else {
            context.log.info(format!("notification '{method}' handled"));
        }
        return StatusCode::OK.into_response();
    }

    let dispatch = DispatchContext {
        cache: context.cache.clone(),
        backend: context.backend.clone(),
        log: context.log.clone(),
    };
    match route(&context, dispatch, &method, request.params).await {
        Ok(result) => {
            let response = JsonRpcResponse::success(request.id, result);
            (StatusCode::OK, axum::Json(response)).into_response()
        }
        Err(e) => error_response(request.id, &e),
    }
}

/// Routes a parsed, validated request to its handler and returns the
/// `result` payload for a successful call. `notifications/*` always
/// succeeds with a null result; unknown methods are `MethodNotFound`.
async fn route(
    context: &Arc<AppContext>,
    dispatch: DispatchContext,
    method: &str,
    params: Option<serde_json::Value>,
) -> Result<serde_json::Value, McpError> {
    match method {
        "initialize" => Ok(serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": context.config.server_name,
                "version": context.config.server_version,
            },
            "capabilities": {}
        })),
        "tools/list" => Ok(serde_json::json!({ "tools": context.registry.list() })),
        "tools/call" => {
            let params = params.ok_or_else(|| McpError::invalid_params("missing params"))?;
            let name = params
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| McpError::invalid_params("params.name must be a string"))?;
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| serde_json::json!({}));
            let result = context
                .dispatcher
                .execute(dispatch, name, arguments)
                .await?;
            Ok(serde_json::to_value(result).unwrap_or(serde_json::Value::Null))
        }
        m if m.starts_with("notifications/") => Ok(serde_json::Value::Null),
        other => Err(McpError::MethodNotFound(format!(
            "Method not found: {other}"
        ))),
    }
}

fn error_response(id: Option<serde_json::Value>, error: &McpError) -> Response {
    let status = error.http_status();
    let body = JsonRpcResponse::failure(id, error);
    (status, axum::Json(body)).into_response()
}

/// Direct (non-proxied) stdio operation: reads one JSON-RPC request per
/// line from stdin, writes one response per line to stdout. Kept from the
/// teacher's `run_server_stdio` almost verbatim -- buffered I/O, flush after
/// every line, all diagnostics to stderr so the protocol stream on stdout
/// stays clean.
pub async fn run_stdio(context: Arc<AppContext>) -> std::io::Result<()> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

    eprintln!("MCP Server Starting (stdio mode)");
    eprintln!("  Name: {}", context.config.server_name);
    eprintln!("  Version: {}", context.config.server_version);

    let stdin = tokio::io::stdin();
    let mut stdin = BufReader::with_capacity(8192, stdin).lines();
    let stdout = tokio::io::stdout();
    let mut stdout = BufWriter::with_capacity(8192, stdout);

    while let Some(line) = stdin.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request: Result<JsonRpcRequest, _> = serde_json::from_str(&line);
        let request = match request {
            Ok(req) => req,
            Err(e) => {
                eprintln!("parse error: {e}");
                if let Ok(partial) = serde_json::from_str::<serde_json::Value>(&line) {
                    let id = partial.get("id").cloned();
                    write_response(&mut stdout, &JsonRpcResponse::failure(id, &McpError::ParseError)).await;
                }
                continue;
            }
        };

        context.increment_request_count();
        if request.jsonrpc.as_deref() != Some("2.0") {
            write_response(
                &mut stdout,
                &JsonRpcResponse::failure(request.id, &McpError::InvalidRequest),
            )
            .await;
            continue;
        }
        let Some(method) = request.method.clone() else {
            write_response(
                &mut stdout,
                &JsonRpcResponse::failure(request.id, &McpError::InvalidRequest),
            )
            .await;
            continue;
        };

        let dispatch = DispatchContext {
            cache: context.cache.clone(),
            backend: context.backend.clone(),
            log: context.log.clone(),
        };

        if request.id.is_none() {
            let _ = route(&context, dispatch, &method, request.params).await;
            continue;
        }

        match route(&context, dispatch, &method, request.params).await {
            Ok(result) => {
                write_response(&mut stdout, &JsonRpcResponse::success(request.id, result)).await;
            }
            Err(e) => {
                write_response(&mut stdout, &JsonRpcResponse::failure(request.id, &e)).await;
            }
        }
    }

    Ok(())
}

async fn write_response(
    stdout: &mut (impl tokio::io::AsyncWrite + Unpin),
    response: &JsonRpcResponse,
) {
    use tokio::io::AsyncWriteExt;
    let Ok(json) = serde_json::to_string(response) else {
        eprintln!("failed to serialize response");
        return;
    };
    if stdout.write_all(json.as_bytes()).await.is_err() {
        return;
    }
    if stdout.write_all(b"\n").await.is_err() {
        return;
    }
    let _ = stdout.flush().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StubBackend;
    use crate::core::cache::ResultsCache;
    use crate::core::config::Config;
    use crate::core::log_buffer::LogBuffer;
    use crate::tools;
    use clap::Parser;
    use tower::ServiceExt;

    fn test_context() -> Arc<AppContext> {
        let config = Config::parse_from(["mcp-server"]);
        let backend: Arc<dyn crate::backend::SimulationBackend> = Arc::new(StubBackend::new());
        let (registry, dispatcher) = tools::build();
        let registry = Arc::new(registry);
        let dispatcher = Arc::new(dispatcher);
        let ctx = AppContext::new(
            config,
            Arc::new(ResultsCache::new()),
            backend,
            Arc::new(LogBuffer::new(1000)),
            registry,
            dispatcher,
        );
        ctx.set_bound_port(8081);
        Arc::new(ctx)
    }

    async fn post_json(
        router: &Router,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn initialize_returns_protocol_version_and_server_info() {
        let router = router(test_context());
        let (status, body) = post_json(
            &router,
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(body["id"], 1);
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let router = router(test_context());
        let (status, body) = post_json(
            &router,
            serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "nonexistent"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn notification_returns_empty_200_body() {
        let router = router(test_context());
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(
                serde_json::to_vec(
                    &serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
                )
                .unwrap(),
            ))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn null_id_round_trips_as_null() {
        let router = router(test_context());
        let (_, body) = post_json(
            &router,
            serde_json::json!({"jsonrpc": "2.0", "id": null, "method": "tools/list"}),
        )
        .await;
        assert!(body["id"].is_null());
    }

    #[tokio::test]
    async fn malformed_jsonrpc_version_is_invalid_request() {
        let router = router(test_context());
        let (status, body) = post_json(
            &router,
            serde_json::json!({"jsonrpc": "1.0", "id": 1, "method": "initialize"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn discovery_reflects_bound_port() {
        let router = router(test_context());
        let request = axum::http::Request::builder()
            .method("GET")
            .uri("/discovery")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["port"], 8081);
    }
}
