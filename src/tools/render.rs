/// Rendering tools: `render_schematic`, `plot_results`. Both return an
/// image content item (base64 PNG) rather than text.
use serde_json::Value;

use crate::core::dispatcher::{DispatchContext, ToolDispatcher};
use crate::core::error::McpError;
use crate::core::protocol::{ToolDescriptor, ToolResult};
use crate::tools::args::{backend_error, object_schema, require_str};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "render_schematic".to_string(),
            description: "Renders a circuit's schematic as a PNG image.".to_string(),
            input_schema: object_schema(
                serde_json::json!({"circuitId": {"type": "string"}}),
                &["circuitId"],
            ),
        },
        ToolDescriptor {
            name: "plot_results".to_string(),
            description: "Renders a plot of a circuit's most recently cached analysis as a PNG image."
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
        "render_schematic",
        Box::new(|ctx, args| Box::pin(render_schematic(ctx, args))),
    );
    dispatcher.register(
        "plot_results",
        Box::new(|ctx, args| Box::pin(plot_results(ctx, args))),
    );
}

async fn render_schematic(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let png = ctx
        .backend
        .render_schematic(&circuit_id)
        .await
        .map_err(backend_error)?;
    Ok(ToolResult::image(encode_png(&png), "image/png"))
}

async fn plot_results(ctx: DispatchContext, args: Value) -> Result<ToolResult, McpError> {
    let circuit_id = require_str(&args, "circuitId")?;
    let cached = ctx.cache.get(&circuit_id).ok_or_else(|| {
        McpError::invalid_params(format!(
            "no cached analysis results for circuit '{circuit_id}'; run an analysis first"
        ))
    })?;
    let png = ctx.backend.render_plot(&cached).await.map_err(backend_error)?;
    Ok(ToolResult::image(encode_png(&png), "image/png"))
}

fn encode_png(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StubBackend;
    use crate::core::cache::ResultsCache;
    use crate::core::log_buffer::LogBuffer;
    use crate::core::protocol::ContentItem;
    use std::sync::Arc;

    fn context() -> DispatchContext {
        DispatchContext {
            cache: Arc::new(ResultsCache::new()),
            backend: Arc::new(StubBackend::new()),
            log: Arc::new(LogBuffer::new(100)),
        }
    }

    #[tokio::test]
    async fn render_schematic_returns_an_image_item() {
        let ctx = context();
        ctx.backend.create_circuit("c1").await.unwrap();
        let result = render_schematic(ctx, serde_json::json!({"circuitId": "c1"}))
            .await
            .unwrap();
        assert!(matches!(result.content[0], ContentItem::Image { .. }));
    }

    #[tokio::test]
    async fn plot_results_without_cached_analysis_fails() {
        let ctx = context();
        ctx.backend.create_circuit("c1").await.unwrap();
        let err = plot_results(ctx, serde_json::json!({"circuitId": "c1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn plot_results_after_analysis_returns_an_image() {
        let ctx = context();
        ctx.backend.create_circuit("c1").await.unwrap();
        let result = ctx
            .backend
            .run_transient("c1", serde_json::json!({}))
            .await
            .unwrap();
        ctx.cache.store("c1", result);
        let result = plot_results(ctx, serde_json::json!({"circuitId": "c1"}))
            .await
            .unwrap();
        assert!(matches!(result.content[0], ContentItem::Image { .. }));
    }
}
