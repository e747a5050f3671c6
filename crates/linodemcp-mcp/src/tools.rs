//! Tool registry for MCP tools.
//!
//! The registry maps tool names to their handlers. It is filled once at
//! startup (see [`crate::catalog::register_all`]) and read concurrently by the
//! dispatcher afterwards.

use crate::handlers::ToolHandler;
use crate::protocol::ToolDefinition;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while registering tools.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateName(String),

    #[error("invalid tool name '{0}': expected dotted lowercase ASCII")]
    InvalidName(String),
}

/// Registry of available MCP tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name its definition declares.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        let name = handler.definition().name;
        if !is_valid_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.tools.insert(name, handler);
        Ok(())
    }

    /// Get a tool's handler by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tools.get(name)
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definitions of every tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<_> = self.tools.values().map(|h| h.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Dotted lowercase: segments of `[a-z0-9_]` joined by single dots.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        })
}

/// Kind of one declared argument.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Integer,
    String,
    /// A string restricted to the listed values.
    Enum(&'static [&'static str]),
    Boolean,
    StringArray,
    ObjectArray(InputSchema),
    Object(InputSchema),
}

impl FieldKind {
    fn to_schema(&self, description: &str) -> Value {
        let mut schema = match self {
            FieldKind::Integer => json!({"type": "integer"}),
            FieldKind::String => json!({"type": "string"}),
            FieldKind::Enum(values) => json!({"type": "string", "enum": values}),
            FieldKind::Boolean => json!({"type": "boolean"}),
            FieldKind::StringArray => json!({"type": "array", "items": {"type": "string"}}),
            FieldKind::ObjectArray(item) => json!({"type": "array", "items": item.build()}),
            FieldKind::Object(nested) => nested.build(),
        };
        if let Value::Object(map) = &mut schema {
            map.insert("description".into(), Value::String(description.to_string()));
        }
        schema
    }
}

/// Builder for a tool's JSON-schema argument declaration.
#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    properties: Vec<(String, FieldKind, String)>,
    required: Vec<String>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required field.
    pub fn required(mut self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.required.push(name.to_string());
        self.properties
            .push((name.to_string(), kind, description.to_string()));
        self
    }

    /// Declare an optional field.
    pub fn optional(mut self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.properties
            .push((name.to_string(), kind, description.to_string()));
        self
    }

    pub fn build(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, kind, description)| (name.clone(), kind.to_schema(description)))
            .collect();
        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !self.required.is_empty() {
            schema["required"] = json!(self.required);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Account;
    use crate::arguments::Arguments;
    use crate::error::ToolError;
    use crate::protocol::ToolResult;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct Stub(&'static str);

    #[async_trait]
    impl ToolHandler for Stub {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.0.to_string(),
                description: Some(format!("Test tool: {}", self.0)),
                input_schema: InputSchema::new().build(),
                annotations: None,
            }
        }

        async fn call(
            &self,
            _cancel: &CancellationToken,
            _args: &Arguments,
            _account: &Account,
        ) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::text(self.0))
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Stub("test.get"))).unwrap();

        assert!(registry.get("test.get").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert!(registry.contains("test.get"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Stub("test.get"))).unwrap();
        assert_eq!(
            registry.register(Arc::new(Stub("test.get"))),
            Err(RegistryError::DuplicateName("test.get".into()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry = ToolRegistry::new();
        for name in ["", "Upper.case", "double..dot", "trailing.", "spa ce"] {
            assert!(matches!(
                registry.register(Arc::new(Stub(name))),
                Err(RegistryError::InvalidName(_))
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_definitions_sorted() {
        let mut registry = ToolRegistry::new();
        for name in ["b.list", "a.list", "c.get"] {
            registry.register(Arc::new(Stub(name))).unwrap();
        }
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a.list", "b.list", "c.get"]);
        assert_eq!(registry.names(), vec!["a.list", "b.list", "c.get"]);
    }

    #[test]
    fn test_input_schema_shape() {
        let rule =
            InputSchema::new().required("action", FieldKind::Enum(&["ACCEPT", "DROP"]), "Action");
        let schema = InputSchema::new()
            .required("linode_id", FieldKind::Integer, "Instance ID")
            .optional("tags", FieldKind::StringArray, "Tags")
            .optional("rules", FieldKind::ObjectArray(rule), "Rules")
            .build();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["linode_id"]));
        assert_eq!(schema["properties"]["linode_id"]["type"], "integer");
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(
            schema["properties"]["rules"]["items"]["properties"]["action"]["enum"],
            json!(["ACCEPT", "DROP"])
        );
    }

    #[test]
    fn test_empty_schema_has_no_required() {
        let schema = InputSchema::new().build();
        assert!(schema.get("required").is_none());
    }
}
