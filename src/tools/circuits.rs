/// Circuit CRUD: `create_circuit`, `list_circuits`, `delete_circuit`.
/// `delete_circuit` clears the results cache, per the dispatcher's
/// mutating-handler contract.
use serde_json::Value;

use crate::core::dispatcher::{DispatchContext, ToolDispatcher};
use crate::core::error::McpError;
use crate::core::protocol::{ToolDescriptor, ToolResult};
use crate::tools::args::{backend_error, object_schema, require_str};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "create_circuit".to_string(),
            description: "Creates a new, empty circuit with the given id.".to_string(),
            input_schema: object_schema(
                serde_json::json!({"circuitId": {"type": "string"}}),
                &["circuitId"],
            ),
        },
        ToolDescriptor {
            name: "list_circuits".to_string(),
            description: "Lists the ids of all circuits currently held by the backend."
                .to_string(),
            input_schema: object_schema(serde_json::json!({}), &[]),
        },
        ToolDescriptor {
            name: "delete_circuit".to_string(),
            description: "Deletes a circuit and its cached analysis results.".to_string(),
            input_schema: object_schema(
                serde_json::json!({"circuitId": {"type": "string"}}),
                &["circuitId"],
            ),
        },
    ]
}

pub fn register(dispatcher: &mut ToolDispatcher) {
    dispatcher.register(
        "create_circuit",
        Box::new(|ctx, args| Box::pin(create_circuit(ctx, args))),
    );
    dispatcher.register(
        "list_circuits",
        Box::new(|ctx, args| Box::pin(list_circuits(ctx, args))),
    );
    dispatcher.register(
        "delete_circuit",
        Box::new(|ctx, args| Box::pin(delete_circuit(ctx, args))),
    );
}

async fn create_circuit(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    ctx.backend
        .create_circuit(&circuit_id)
        .await
        .map_err(backend_error)?;
    Ok(ToolResult::json(
        &serde_json::json!({"circuitId": circuit_id, "created": true}),
    ))
}

async fn list_circuits(ctx: DispatchContext, _args: Value) -> Result<ToolResult, McpError> {
    let circuits = ctx.backend.list_circuits().await;
    Ok(ToolResult::json(&serde_json::json!({"circuits": circuits})))
}

async fn delete_circuit(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    ctx.backend
        .delete_circuit(&circuit_id)
        .await
        .map_err(backend_error)?;
    ctx.cache.clear(&circuit_id);
    Ok(ToolResult::json(
        &serde_json::json!({"circuitId": circuit_id, "deleted": true}),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StubBackend;
    use crate::core::cache::ResultsCache;
    use crate::core::log_buffer::LogBuffer;
    use std::sync::Arc;

    fn context() -> DispatchContext {
        DispatchContext {
            cache: Arc::new(ResultsCache::new()),
            backend: Arc::new(StubBackend::new()),
            log: Arc::new(LogBuffer::new(100)),
        }
    }

    #[tokio::test]
    async fn create_then_list_contains_circuit() {
        let ctx = context();
        create_circuit(ctx.clone(), serde_json::json!({"circuitId": "c1"}))
            .await
            .unwrap();
        let result = list_circuits(ctx, Value::Null).await.unwrap();
        let text = match &result.content[0] {
            crate::core::protocol::ContentItem::Text { text, .. } => text.clone(),
            _ => panic!("expected text content"),
        };
        assert!(text.contains("c1"));
    }

    #[tokio::test]
    async fn delete_then_list_no_longer_contains_circuit() {
        let ctx = context();
        create_circuit(ctx.clone(), serde_json::json!({"circuitId": "c1"})).await.unwrap();
        delete_circuit(ctx.clone(), serde_json::json!({"circuitId": "c1"})).await.unwrap();
        let result = list_circuits(ctx, Value::Null).await.unwrap();
        let text = match &result.content[0] {
            crate::core::protocol::ContentItem::Text { text, .. } => text.clone(),
            _ => panic!("expected text content"),
        };
        assert!(!text.contains("\"c1\""));
    }

    #[tokio::test]
    async fn create_circuit_missing_id_is_invalid_params() {
        let ctx = context();
        let err = create_circuit(ctx, Value::Null).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn delete_unknown_circuit_is_invalid_params() {
        let ctx = context();
        let err = delete_circuit(ctx, serde_json::json!({"circuitId": "nope"}))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }
}
