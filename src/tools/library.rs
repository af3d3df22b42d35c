/// Component catalog lookup: `lookup_component`. Unlike the other tools
/// this one is not scoped to a circuit.
use serde_json::Value;

use crate::core::dispatcher::{DispatchContext, ToolDispatcher};
use crate::core::error::McpError;
use crate::core::protocol::{ToolDescriptor, ToolResult};
use crate::tools::args::{backend_error, object_schema, optional_value};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: "lookup_component".to_string(),
        description: "Searches the component catalog by kind or description substring.".to_string(),
        input_schema: object_schema(serde_json::json!({"query": {"type": "string"}}), &[]),
    }]
}

pub fn register(dispatcher: &mut ToolDispatcher) {
    dispatcher.register(
        "lookup_component",
        Box::new(|ctx, args| Box::pin(lookup_component(ctx, args))),
    );
}

async fn lookup_component(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let query = optional_value(&args, "query")
        .as_str()
        .unwrap_or("")
        .to_string();
    let matches = ctx.backend.lookup_component(&query).await.map_err(backend_error)?;
    Ok(ToolResult::json(&serde_json::to_value(matches).unwrap_or(Value::Null)))
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
    async fn lookup_by_kind_finds_a_single_match() {
        let ctx = context();
        let result = lookup_component(ctx, serde_json::json!({"query": "R"})).await.unwrap();
        let text = match &result.content[0] {
            crate::core::protocol::ContentItem::Text { text, .. } => text.clone(),
            _ => panic!("expected text"),
        };
        assert!(text.contains("resistor"));
    }

    #[tokio::test]
    async fn lookup_with_empty_query_returns_the_whole_catalog() {
        let ctx = context();
        let result = lookup_component(ctx, serde_json::json!({})).await.unwrap();
        let text = match &result.content[0] {
            crate::core::protocol::ContentItem::Text { text, .. } => text.clone(),
            _ => panic!("expected text"),
        };
        assert!(text.contains("diode"));
    }
}
