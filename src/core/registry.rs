/// ToolRegistry (C2): an immutable-after-construction catalog of tool
/// descriptors. Generalizes the teacher's `ToolRegistry` (a `Vec<MCPTool>`
/// plus a `HashMap<String, ToolHandler>`) by separating the descriptor list
/// from handler storage (handlers live in `ToolDispatcher`) and by running
/// full schema validation at construction instead of trusting each
/// registration call.
use std::collections::HashMap;
use std::fmt;

use crate::core::protocol::ToolDescriptor;

#[derive(Debug)]
pub struct RegistryError {
    pub offenders: Vec<String>,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid tool descriptor(s): {}",
            self.offenders.join("; ")
        )
    }
}

impl std::error::Error for RegistryError {}

#[derive(Debug)]
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Validates every descriptor in one pass and returns an aggregate error
    /// naming every offending tool, rather than failing fast on the first
    /// bad entry.
    pub fn new(descriptors: Vec<ToolDescriptor>) -> Result<Self, RegistryError> {
        let mut offenders = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for d in &descriptors {
            let label = if d.name.is_empty() {
                "<unnamed>".to_string()
            } else {
                d.name.clone()
            };
            if d.name.is_empty() {
                offenders.push(format!("{label}: empty name"));
                continue;
            }
            if !seen.insert(d.name.clone()) {
                offenders.push(format!("{label}: duplicate name"));
                continue;
            }
            if d.description.is_empty() {
                offenders.push(format!("{label}: empty description"));
            }
            if d.input_schema.is_null() {
                offenders.push(format!("{label}: null inputSchema"));
                continue;
            }
            match d.input_schema.get("type").and_then(|v| v.as_str()) {
                Some("object") => {}
                _ => offenders.push(format!("{label}: inputSchema.type must be \"object\"")),
            }
            match d.input_schema.get("properties") {
                Some(v) if v.is_object() => {}
                Some(_) => offenders.push(format!("{label}: inputSchema.properties must be an object")),
                None => offenders.push(format!("{label}: inputSchema.properties must be an object")),
            }
            match d.input_schema.get("required") {
                Some(v) if v.is_array() => {}
                None => {}
                Some(_) => offenders.push(format!("{label}: inputSchema.required must be an array")),
            }
        }

        if !offenders.is_empty() {
            return Err(RegistryError { offenders });
        }

        let index = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();

        Ok(Self { descriptors, index })
    }

    /// Descriptors in declaration order, for `tools/list`.
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: "does a thing".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    #[test]
    fn construction_succeeds_with_valid_descriptors() {
        let reg = ToolRegistry::new(vec![valid("a"), valid("b")]).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.list()[0].name, "a");
        assert_eq!(reg.list()[1].name, "b");
    }

    #[test]
    fn list_preserves_declaration_order() {
        let reg = ToolRegistry::new(vec![valid("z"), valid("a"), valid("m")]).unwrap();
        let names: Vec<_> = reg.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn get_returns_descriptor_by_name() {
        let reg = ToolRegistry::new(vec![valid("echo")]).unwrap();
        assert!(reg.get("echo").is_some());
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn empty_name_fails_construction() {
        let mut bad = valid("");
        bad.description = "x".to_string();
        let err = ToolRegistry::new(vec![bad]).unwrap_err();
        assert!(err.offenders.iter().any(|o| o.contains("empty name")));
    }

    #[test]
    fn aggregate_error_lists_every_offending_tool() {
        let mut no_desc = valid("a");
        no_desc.description = String::new();
        let mut bad_type = valid("b");
        bad_type.input_schema = serde_json::json!({"type": "string", "properties": {}});
        let err = ToolRegistry::new(vec![no_desc, bad_type]).unwrap_err();
        assert_eq!(err.offenders.len(), 2);
        assert!(err.offenders.iter().any(|o| o.starts_with("a:")));
        assert!(err.offenders.iter().any(|o| o.starts_with("b:")));
    }

    #[test]
    fn non_object_properties_fails() {
        let mut bad = valid("a");
        bad.input_schema = serde_json::json!({"type": "object", "properties": "nope"});
        assert!(ToolRegistry::new(vec![bad]).is_err());
    }

    #[test]
    fn non_array_required_fails() {
        let mut bad = valid("a");
        bad.input_schema =
            serde_json::json!({"type": "object", "properties": {}, "required": "nope"});
        assert!(ToolRegistry::new(vec![bad]).is_err());
    }

    #[test]
    fn duplicate_name_fails() {
        let err = ToolRegistry::new(vec![valid("a"), valid("a")]).unwrap_err();
        assert!(err.offenders.iter().any(|o| o.contains("duplicate")));
    }
}
