/// Netlist import/export and circuit validation: `import_netlist`,
/// `export_netlist`, `validate_circuit`. `import_netlist` mutates and so
/// clears the circuit's cached analysis result.
use serde_json::Value;

use crate::core::dispatcher::{DispatchContext, ToolDispatcher};
use crate::core::error::McpError;
use crate::core::protocol::{ToolDescriptor, ToolResult};
use crate::tools::args::{backend_error, object_schema, require_str};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "import_netlist".to_string(),
            description: "Replaces a circuit's components with those parsed from a netlist."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({
                    "circuitId": {"type": "string"},
                    "netlist": {"type": "string"},
                }),
                &["circuitId", "netlist"],
            ),
        },
        ToolDescriptor {
            name: "export_netlist".to_string(),
            description: "Renders a circuit's components as a netlist, sorted by component name."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({"circuitId": {"type": "string"}}),
                &["circuitId"],
            ),
        },
        ToolDescriptor {
            name: "validate_circuit".to_string(),
            description: "Runs structural validation on a circuit and reports any issues."
                .to_string(),
            input_schema: object_schema(
                serde_json::json!({"circuitId": {"type": "string"}}),
                &["circuitId"],
            ),
        },
    ]
}

pub fn register(dispatcher: &mut ToolDispatcher) {
    dispatcher.register(
        "import_netlist",
        Box::new(|ctx, args| Box::pin(import_netlist(ctx, args))),
    );
    dispatcher.register(
        "export_netlist",
        Box::new(|ctx, args| Box::pin(export_netlist(ctx, args))),
    );
    dispatcher.register(
        "validate_circuit",
        Box::new(|ctx, args| Box::pin(validate_circuit(ctx, args))),
    );
}

async fn import_netlist(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let netlist = require_str(&args, "netlist")?;
    ctx.backend
        .import_netlist(&circuit_id, &netlist)
        .await
        .map_err(backend_error)?;
    ctx.cache.clear(&circuit_id);
    Ok(ToolResult::json(
        &serde_json::json!({"circuitId": circuit_id, "imported": true}),
    ))
}

async fn export_netlist(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let netlist = ctx
        .backend
        .export_netlist(&circuit_id)
        .await
        .map_err(backend_error)?;
    Ok(ToolResult::text(netlist))
}

async fn validate_circuit(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let report = ctx
        .backend
        .validate_circuit(&circuit_id)
        .await
        .map_err(backend_error)?;
    Ok(ToolResult::json(&serde_json::to_value(report).unwrap_or(Value::Null)))
}
