/// Analyses: `run_dc_sweep`, `run_transient`, `run_ac_analysis`,
/// `run_operating_point`, `run_parameter_sweep`, `run_temperature_sweep`.
/// Each stores its result in the `ResultsCache` keyed by circuit id so a
/// later `plot_results`/`measure`/`compute_impedance`/`group_delay` call can
/// read it back.
use serde_json::Value;

use crate::core::cache::CachedAnalysisResult;
use crate::core::dispatcher::{DispatchContext, ToolDispatcher};
use crate::core::error::McpError;
use crate::core::protocol::{ToolDescriptor, ToolResult};
use crate::tools::args::{backend_error, object_schema, require_str};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "run_dc_sweep".to_string(),
            description: "Runs a DC sweep analysis and caches the result for plotting."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "start": {"type": "number"},
                    "stop": {"type": "number"},
                    "step": {"type": "number"},
                }),
                &["circuitId"],
            ),
        },
        ToolDescriptor {
            name: "run_transient".to_string(),
            description: "Runs a transient analysis and caches the result for plotting."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "t_stop": {"type": "number"},
                    "t_step": {"type": "number"},
                }),
                &["circuitId"],
            ),
        },
        ToolDescriptor {
            name: "run_ac_analysis".to_string(),
            description: "Runs an AC (small-signal frequency) analysis and caches the result."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "f_start": {"type": "number"},
                    "f_stop": {"type": "number"},
                    "points": {"type": "number"},
                }),
                &["circuitId"],
            ),
        },
        ToolDescriptor {
            name: "run_operating_point".to_string(),
            description: "Computes the DC operating point and caches the result.".to_string(),
            input_schema: object_schema(
                serde_json::json!({"circuitId": {"type": "string"}}),
                &["circuitId"],
            ),
        },
        ToolDescriptor {
            name: "run_parameter_sweep".to_string(),
            description: "Sweeps a component parameter across a range and caches the result."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "parameter": {"type": "string"},
                    "start": {"type": "number"},
                    "stop": {"type": "number"},
                    "step": {"type": "number"},
                }),
                &["circuitId"],
            ),
        },
        ToolDescriptor {
            name: "run_temperature_sweep".to_string(),
            description: "Sweeps ambient temperature across a range and caches the result."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "start_c": {"type": "number"},
                    "stop_c": {"type": "number"},
                    "step_c": {"type": "number"},
                }),
                &["circuitId"],
            ),
        },
    ]
}

pub fn register(dispatcher: &mut ToolDispatcher) {
    dispatcher.register("run_dc_sweep", Box::new(|ctx, args| Box::pin(run_dc_sweep(ctx, args))));
    dispatcher.register("run_transient", Box::new(|ctx, args| Box::pin(run_transient(ctx, args))));
    dispatcher.register(
        "run_ac_analysis",
        Box::new(|ctx, args| Box::pin(run_ac_analysis(ctx, args))),
    );
    dispatcher.register(
        "run_operating_point",
        Box::new(|ctx, args| Box::pin(run_operating_point(ctx, args))),
    );
    dispatcher.register(
        "run_parameter_sweep",
        Box::new(|ctx, args| Box::pin(run_parameter_sweep(ctx, args))),
    );
    dispatcher.register(
        "run_temperature_sweep",
        Box::new(|ctx, args| Box::pin(run_temperature_sweep(ctx, args))),
    );
}

/// Stores a freshly computed result and serializes it as the tool's
/// response, after re-checking the data-model invariants the backend is
/// contractually supposed to uphold.
fn finish(
    ctx: &DispatchContext,
    circuit_id: &str,
    result: CachedAnalysisResult,
) -> Result<ToolResult, McpError> {
    result
        .validate()
        .map_err(|e| McpError::internal(format!("backend produced an invalid analysis result: {e}")))?;
    ctx.cache.store(circuit_id, result.clone());
    Ok(ToolResult::json(&serde_json::to_value(result).unwrap_or(Value::Null)))
}

async fn run_dc_sweep(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let result = ctx
        .backend
        .run_dc_sweep(&circuit_id, args.clone())
        .await
        .map_err(backend_error)?;
    finish(&ctx, &circuit_id, result)
}

async fn run_transient(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let result = ctx
        .backend
        .run_transient(&circuit_id, args.clone())
        .await
        .map_err(backend_error)?;
    finish(&ctx, &circuit_id, result)
}

async fn run_ac_analysis(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let result = ctx
        .backend
        .run_ac_analysis(&circuit_id, args.clone())
        .await
        .map_err(backend_error)?;
    finish(&ctx, &circuit_id, result)
}

async fn run_operating_point(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let result = ctx
        .backend
        .run_operating_point(&circuit_id)
        .await
        .map_err(backend_error)?;
    finish(&ctx, &circuit_id, result)
}

async fn run_parameter_sweep(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let result = ctx
        .backend
        .run_parameter_sweep(&circuit_id, args.clone())
        .await
        .map_err(backend_error)?;
    finish(&ctx, &circuit_id, result)
}

async fn run_temperature_sweep(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let result = ctx
        .backend
        .run_temperature_sweep(&circuit_id, args.clone())
        .await
        .map_err(backend_error)?;
    finish(&ctx, &circuit_id, result)
}
