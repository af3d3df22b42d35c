/// Derived-analysis tools that read back a circuit's cached result:
/// `compute_impedance`, `measure`, `group_delay`. All three fail with
/// `InvalidParams` if no analysis has been cached for the circuit yet --
/// this is the failure mode exercised by the cache-invalidation scenario
/// once a mutating tool has cleared the entry.
use serde_json::Value;

use crate::core::cache::CachedAnalysisResult;
use crate::core::dispatcher::{DispatchContext, ToolDispatcher};
use crate::core::error::McpError;
use crate::core::protocol::{ToolDescriptor, ToolResult};
use crate::tools::args::{backend_error, object_schema, require_str};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "compute_impedance".to_string(),
            description: "Computes impedance from a circuit's most recently cached AC analysis."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "signal": {"type": "string"},
                }),
                &["circuitId"],
            ),
        },
        ToolDescriptor {
            name: "measure".to_string(),
            description: "Extracts min/max/peak-to-peak statistics for a signal from a circuit's cached analysis."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "signal": {"type": "string"},
                }),
                &["circuitId", "signal"],
            ),
        },
        ToolDescriptor {
            name: "group_delay".to_string(),
            description: "Computes group delay from a circuit's most recently cached AC analysis."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "signal": {"type": "string"},
                }),
                &["circuitId"],
            ),
        },
    ]
}

pub fn register(dispatcher: &mut ToolDispatcher) {
    dispatcher.register(
        "compute_impedance",
        Box::new(|ctx, args| Box::pin(compute_impedance(ctx, args))),
    );
    dispatcher.register("measure", Box::new(|ctx, args| Box::pin(measure(ctx, args))));
    dispatcher.register(
        "group_delay",
        Box::new(|ctx, args| Box::pin(group_delay(ctx, args))),
    );
}

fn cached_or_error(ctx: &DispatchContext, circuit_id: &str) -> Result<CachedAnalysisResult, McpError> {
    ctx.cache.get(circuit_id).ok_or_else(|| {
        McpError::invalid_params(format!(
            "no cached analysis results for circuit '{circuit_id}'; run an analysis first"
        ))
    })
}

async fn compute_impedance(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let cached = cached_or_error(&ctx, &circuit_id)?;
    let result = ctx
        .backend
        .compute_impedance(&cached, args)
        .await
        .map_err(backend_error)?;
    Ok(ToolResult::json(&result))
}

async fn measure(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    require_str(&args, "signal")?;
    let cached = cached_or_error(&ctx, &circuit_id)?;
    let result = ctx.backend.measure(&cached, args).await.map_err(backend_error)?;
    Ok(ToolResult::json(&result))
}

async fn group_delay(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let cached = cached_or_error(&ctx, &circuit_id)?;
    let result = ctx
        .backend
        .group_delay(&cached, args)
        .await
        .map_err(backend_error)?;
    Ok(ToolResult::json(&result))
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
    async fn measure_without_cached_analysis_is_invalid_params() {
        let ctx = context();
        let err = measure(
            ctx,
            serde_json::json!({"circuitId": "c1", "signal": "v(out)"}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn measure_missing_signal_is_invalid_params() {
        let ctx = context();
        ctx.backend.create_circuit("c1").await.unwrap();
        let ac_result = ctx
            .backend
            .run_ac_analysis("c1", serde_json::json!({}))
            .await
            .unwrap();
        ctx.cache.store("c1", ac_result);
        let err = measure(ctx, serde_json::json!({"circuitId": "c1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn measure_reads_a_cached_ac_result() {
        let ctx = context();
        ctx.backend.create_circuit("c1").await.unwrap();
        let ac_result = ctx
            .backend
            .run_ac_analysis("c1", serde_json::json!({}))
            .await
            .unwrap();
        ctx.cache.store("c1", ac_result);
        let result = measure(
            ctx,
            serde_json::json!({"circuitId": "c1", "signal": "v(out)"}),
        )
        .await
        .unwrap();
        assert_eq!(result.content.len(), 1);
    }
}
