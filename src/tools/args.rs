/// Small typed-accessor helpers shared by every tool handler, concentrating
/// the -32602 (`InvalidParams`) mapping for malformed arguments in one
/// place per the dispatcher's "argument parsing is local to each handler"
/// design note.
use serde_json::Value;

use crate::backend::BackendError;
use crate::core::error::McpError;

/// Maps a `BackendError` onto the JSON-RPC error taxonomy per spec §7:
/// a missing referenced entity or an invalid topology is the caller's
/// fault (`InvalidParams`); a convergence failure or anything else the
/// backend declares unexpected is ours (`InternalError`).
pub fn backend_error(err: BackendError) -> McpError {
    match err {
        BackendError::CircuitNotFound(id) => {
            McpError::invalid_params(format!("no such circuit: {id}"))
        }
        BackendError::ComponentNotFound(id) => {
            McpError::invalid_params(format!("no such component: {id}"))
        }
        BackendError::ModelNotFound(id) => McpError::invalid_params(format!("no such model: {id}")),
        BackendError::SignalNotFound(id) => {
            McpError::invalid_params(format!("no such signal: {id}"))
        }
        BackendError::InvalidTopology(message) => McpError::invalid_params(message),
        BackendError::ConvergenceFailure(message) => McpError::internal(message),
        BackendError::Other(message) => McpError::internal(message),
    }
}

pub fn require_str(args: &Value, field: &str) -> Result<String, McpError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| McpError::invalid_params(format!("'{field}' must be a non-empty string")))
}

pub fn require_str_array(args: &Value, field: &str) -> Result<Vec<String>, McpError> {
    args.get(field)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .ok_or_else(|| McpError::invalid_params(format!("'{field}' must be an array of strings")))
}

pub fn require_f64(args: &Value, field: &str) -> Result<f64, McpError> {
    args.get(field)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| McpError::invalid_params(format!("'{field}' must be a number")))
}

pub fn optional_f64(args: &Value, field: &str, default: f64) -> f64 {
    args.get(field).and_then(|v| v.as_f64()).unwrap_or(default)
}

pub fn optional_value(args: &Value, field: &str) -> Value {
    args.get(field).cloned().unwrap_or(Value::Null)
}

/// `InvalidParams` carrying the set of valid alternatives, per spec's
/// "messages enumerate valid alternatives when the set is small".
pub fn no_such_circuit(circuit_id: &str, known: Vec<String>) -> McpError {
    McpError::invalid_params_with_alternatives(format!("no such circuit: {circuit_id}"), known)
}

pub fn object_schema(properties: Value, required: &[&str]) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
