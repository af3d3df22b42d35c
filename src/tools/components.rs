/// Component and model management: `add_component`, `modify_component`,
/// `component_info`, `define_model`. The three mutating handlers clear the
/// circuit's cached analysis result before returning success.
use serde_json::Value;

use crate::backend::ComponentSpec;
use crate::core::dispatcher::{DispatchContext, ToolDispatcher};
use crate::core::error::McpError;
use crate::core::protocol::{ToolDescriptor, ToolResult};
use crate::tools::args::{backend_error, object_schema, optional_f64, require_str, require_str_array};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "add_component".to_string(),
            description: "Adds a component to a circuit; each component needs at least two nodes."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "componentId": {"type": "string"},
                    "kind": {"type": "string"},
                    "nodes": {"type": "array", "items": {"type": "string"}},
                    "value": {"type": "number"},
                }),
                &["circuitId", "componentId", "kind", "nodes"],
            ),
        },
        ToolDescriptor {
            name: "modify_component".to_string(),
            description: "Patches an existing component's fields (currently: value)."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "componentId": {"type": "string"},
                    "patch": {"type": "object"},
                }),
                &["circuitId", "componentId", "patch"],
            ),
        },
        ToolDescriptor {
            name: "component_info".to_string(),
            description: "Returns a component's kind, nodes, and value.".to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "componentId": {"type": "string"},
                }),
                &["circuitId", "componentId"],
            ),
        },
        ToolDescriptor {
            name: "define_model".to_string(),
            description: "Defines or replaces a named device model for a circuit.".to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "name": {"type": "string"},
                    "params": {"type": "object"},
                }),
                &["circuitId", "name", "params"],
            ),
        },
    ]
}

pub fn register(dispatcher: &mut ToolDispatcher) {
    dispatcher.register(
        "add_component",
        Box::new(|ctx, args| Box::pin(add_component(ctx, args))),
    );
    dispatcher.register(
        "modify_component",
        Box::new(|ctx, args| Box::pin(modify_component(ctx, args))),
    );
    dispatcher.register(
        "component_info",
        Box::new(|ctx, args| Box::pin(component_info(ctx, args))),
    );
    dispatcher.register(
        "define_model",
        Box::new(|ctx, args| Box::pin(define_model(ctx, args))),
    );
}

async fn add_component(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let component_id = require_str(&args, "componentId")?;
    let kind = require_str(&args, "kind")?;
    let nodes = require_str_array(&args, "nodes")?;
    let value = optional_f64(&args, "value", 0.0);

    ctx.backend
        .add_component(
            &circuit_id,
            ComponentSpec {
                id: component_id.clone(),
                kind,
                nodes,
                value,
            },
        )
        .await
        .map_err(backend_error)?;
    ctx.cache.clear(&circuit_id);
    Ok(ToolResult::json(
        &serde_json::json!({"circuitId": circuit_id, "componentId": component_id, "added": true}),
    ))
}

async fn modify_component(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let component_id = require_str(&args, "componentId")?;
    let patch = args.get("patch").cloned().unwrap_or(Value::Null);

    ctx.backend
        .modify_component(&circuit_id, &component_id, patch)
        .await
        .map_err(backend_error)?;
    ctx.cache.clear(&circuit_id);
    Ok(ToolResult::json(
        &serde_json::json!({"circuitId": circuit_id, "componentId": component_id, "modified": true}),
    ))
}

async fn component_info(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let component_id = require_str(&args, "componentId")?;

    let spec = ctx
        .backend
        .component_info(&circuit_id, &component_id)
        .await
        .map_err(backend_error)?;
    Ok(ToolResult::json(&serde_json::to_value(spec).unwrap_or(Value::Null)))
}

async fn define_model(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let name = require_str(&args, "name")?;
    let params = args.get("params").cloned().unwrap_or(Value::Null);

    ctx.backend
        .define_model(&circuit_id, &name, params)
        .await
        .map_err(backend_error)?;
    ctx.cache.clear(&circuit_id);
    Ok(ToolResult::json(
        &serde_json::json!({"circuitId": circuit_id, "model": name, "defined": true}),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StubBackend;
    use crate::core::cache::{AnalysisType, CachedAnalysisResult, ResultsCache};
    use crate::core::log_buffer::LogBuffer;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn context() -> DispatchContext {
        DispatchContext {
            cache: Arc::new(ResultsCache::new()),
            backend: Arc::new(StubBackend::new()),
            log: Arc::new(LogBuffer::new(100)),
        }
    }

    fn sample_result() -> CachedAnalysisResult {
        CachedAnalysisResult {
            analysis_type: AnalysisType::Transient,
            x_data: vec![0.0],
            x_label: "time".to_string(),
            signals: HashMap::new(),
            imaginary_signals: HashMap::new(),
            operating_point_data: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn add_component_clears_cache() {
        let ctx = context();
        ctx.backend.create_circuit("c1").await.unwrap();
        ctx.cache.store("c1", sample_result());
        add_component(
            ctx.clone(),
            serde_json::json!({
                "circuitId": "c1",
                "componentId": "r1",
                "kind": "resistor",
                "nodes": ["1", "0"],
                "value": 1000.0
            }),
        )
        .await
        .unwrap();
        assert!(ctx.cache.get("c1").is_none());
    }

    #[tokio::test]
    async fn add_component_rejects_fewer_than_two_nodes() {
        let ctx = context();
        ctx.backend.create_circuit("c1").await.unwrap();
        let err = add_component(
            ctx,
            serde_json::json!({
                "circuitId": "c1",
                "componentId": "r1",
                "kind": "resistor",
                "nodes": ["1"],
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn component_info_round_trips() {
        let ctx = context();
        ctx.backend.create_circuit("c1").await.unwrap();
        add_component(
            ctx.clone(),
            serde_json::json!({
                "circuitId": "c1",
                "componentId": "r1",
                "kind": "resistor",
                "nodes": ["1", "0"],
                "value": 1000.0
            }),
        )
        .await
        .unwrap();
        let result = component_info(
            ctx,
            serde_json::json!({"circuitId": "c1", "componentId": "r1"}),
        )
        .await
        .unwrap();
        assert_eq!(result.content.len(), 1);
    }
}
