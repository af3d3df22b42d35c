/// `server_status`: a no-argument diagnostic tool, included mostly so a
/// client can sanity-check connectivity and see how many circuits are
/// currently held by the backend. Per the dispatch context's scope (cache,
/// backend, log only -- no `config`), this reports backend state rather
/// than process metadata; a client wanting name/version calls `initialize`.
use serde_json::Value;

use crate::core::dispatcher::{DispatchContext, ToolDispatcher};
use crate::core::protocol::{ToolDescriptor, ToolResult};
use crate::core::error::McpError;
use crate::tools::args::object_schema;

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "server_status".to_string(),
        description: "Reports the number of circuits currently held by the backend.".to_string(),
        input_schema: object_schema(serde_json::json!({}), &[]),
    }
}

pub fn register(dispatcher: &mut ToolDispatcher) {
    dispatcher.register(
        "server_status",
        Box::new(|ctx: DispatchContext, _args: Value| {
            Box::pin(async move { handle(ctx).await })
        }),
    );
}

async fn handle(ctx: DispatchContext) -> Result<ToolResult, McpError> {
    let circuits = ctx.backend.list_circuits().await;
    Ok(ToolResult::json(&serde_json::json!({
        "circuitCount": circuits.len(),
        "circuits": circuits,
    })))
}
