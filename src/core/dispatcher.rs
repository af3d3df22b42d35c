/// ToolDispatcher (C3): routes a `(name, args)` call to a handler bound to
/// one `SimulationBackend` method or a small orchestration.
///
/// Generalizes the teacher's `ToolHandler = Box<dyn Fn(Value) -> Result<Value, String>>`
/// into a context-carrying, async, typed-error handler, per the "process-wide
/// context ... passed by reference into every handler" design note.
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;

use crate::backend::SimulationBackend;
use crate::core::cache::ResultsCache;
use crate::core::error::McpError;
use crate::core::log_buffer::LogBuffer;
use crate::core::protocol::ToolResult;
use crate::core::registry::ToolRegistry;

/// Shared, process-wide context handed to every tool handler. No singletons:
/// this is constructed once in `main` and cloned cheaply (it's all `Arc`s)
/// into the dispatcher and the HTTP/proxy layers.
#[derive(Clone)]
pub struct DispatchContext {
    pub cache: Arc<ResultsCache>,
    pub backend: Arc<dyn SimulationBackend>,
    pub log: Arc<LogBuffer>,
}

pub type ToolFuture = Pin<Box<dyn Future<Output = Result<ToolResult, McpError>> + Send>>;
pub type ToolHandler = Box<dyn Fn(DispatchContext, Value) -> ToolFuture + Send + Sync>;

pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, handler: ToolHandler) {
        let name = name.into();
        debug_assert!(
            self.registry.contains(&name),
            "handler registered for tool '{name}' with no matching descriptor"
        );
        self.handlers.insert(name, handler);
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Executes `name` with `args`. Unknown tool names surface as
    /// `MethodNotFound` (routed to JSON-RPC `-32601` by the caller, since
    /// `tools/call` with an unknown tool name is a routing failure, not a
    /// malformed argument). A panic inside a handler is caught and converted
    /// to `McpError::Internal` so the server stays up.
    pub async fn execute(&self, context: DispatchContext, name: &str, args: Value) -> Result<ToolResult, McpError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| McpError::MethodNotFound(format!("Unknown tool: {name}")))?;

        let fut = handler(context.clone(), args);
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(&panic);
                context.log.error(format!("tool '{name}' panicked: {message}"));
                Err(McpError::internal(format!("tool '{name}' panicked: {message}")))
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::ToolDescriptor;

    fn context() -> DispatchContext {
        DispatchContext {
            cache: Arc::new(ResultsCache::new()),
            backend: Arc::new(crate::backend::StubBackend::new()),
            log: Arc::new(LogBuffer::new(100)),
        }
    }

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: "test".to_string(),
            input_schema: serde_json::json!({"type": "object", "properties": {}, "required": []}),
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found() {
        let registry = Arc::new(ToolRegistry::new(vec![]).unwrap());
        let dispatcher = ToolDispatcher::new(registry);
        let err = dispatcher
            .execute(context(), "nope", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::MethodNotFound(_)));
    }

    #[tokio::test]
    async fn registered_handler_executes() {
        let registry = Arc::new(ToolRegistry::new(vec![descriptor("echo")]).unwrap());
        let mut dispatcher = ToolDispatcher::new(registry);
        dispatcher.register(
            "echo",
            Box::new(|_ctx, args| Box::pin(async move { Ok(ToolResult::json(&args)) })),
        );
        let result = dispatcher
            .execute(context(), "echo", serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(result.content.len(), 1);
    }

    #[tokio::test]
    async fn panicking_handler_is_caught_as_internal_error() {
        let registry = Arc::new(ToolRegistry::new(vec![descriptor("boom")]).unwrap());
        let mut dispatcher = ToolDispatcher::new(registry);
        dispatcher.register(
            "boom",
            Box::new(|_ctx, _args| Box::pin(async move { panic!("kaboom") })),
        );
        let err = dispatcher
            .execute(context(), "boom", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Internal(_)));
    }
}
