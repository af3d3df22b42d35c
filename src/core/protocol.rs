/// JSON-RPC 2.0 / MCP wire types.
///
/// These mirror the teacher's `MCPRequest`/`MCPResponse`/`MCPTool` structs
/// almost field-for-field; the one deliberate change is that `id` stays a
/// bare `Option<serde_json::Value>` rather than a typed enum so that
/// `id: null` round-trips byte-identically instead of being coerced into a
/// string or number variant.
use serde::de::{Deserialize as _, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: Option<serde_json::Value>,
    pub method: Option<String>,
    pub params: Option<serde_json::Value>,
}

/// Deserializes by hand rather than deriving: serde's blanket `Option<T>`
/// handling maps a JSON `null` and an absent key to the same `None`, but
/// the JSON-RPC spec (and spec.md) distinguish them -- `id: null` is a
/// present, valid (if unusual) id, while an absent `id` marks a
/// notification. Going through `serde_json::Map` first lets us tell
/// `map.get("id")` returning `Some(&Value::Null)` from it returning `None`.
impl<'de> Deserialize<'de> for JsonRpcRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = serde_json::Map::deserialize(deserializer)?;
        Ok(JsonRpcRequest {
            jsonrpc: map.get("jsonrpc").and_then(|v| v.as_str()).map(String::from),
            id: map.get("id").cloned(),
            method: map.get("method").and_then(|v| v.as_str()).map(String::from),
            params: map.get("params").cloned(),
        })
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct JsonRpcErrorBody {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Serialize, Debug, Clone)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorBody>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<serde_json::Value>, error: &crate::core::error::McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcErrorBody {
                code: error.code(),
                message: error.message(),
                data: error.data(),
            }),
        }
    }
}

/// A tool's static catalog entry. `input_schema` is validated once at
/// registry construction time (see `registry.rs`).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// A single item of tool output content.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none", rename = "mimeType")]
        mime_type: Option<String>,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text {
            text: text.into(),
            mime_type: None,
        }
    }

    pub fn text_with_mime(text: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ContentItem::Text {
            text: text.into(),
            mime_type: Some(mime_type.into()),
        }
    }

    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ContentItem::Image {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// The structured result of a `tools/call` invocation. Constructed per call,
/// never retained past the response that carries it.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
        }
    }

    pub fn json(value: &serde_json::Value) -> Self {
        Self::text(serde_json::to_string(value).unwrap_or_default())
    }

    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::image(data, mime_type)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_with_null_id_parses_as_present() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"initialize"}"#).unwrap();
        assert!(req.id.is_some());
        assert_eq!(req.id.unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn request_without_id_is_notification() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(req.id.is_none());
    }

    #[test]
    fn response_echoes_null_id() {
        let resp = JsonRpcResponse::success(Some(serde_json::Value::Null), serde_json::json!({}));
        let v = serde_json::to_value(&resp).unwrap();
        assert!(v.get("id").unwrap().is_null());
    }

    #[test]
    fn tool_descriptor_serializes_camel_case_schema_key() {
        let d = ToolDescriptor {
            name: "echo".into(),
            description: "echoes".into(),
            input_schema: serde_json::json!({"type": "object"}),
        };
        let v = serde_json::to_value(&d).unwrap();
        assert!(v.get("inputSchema").is_some());
    }
}
