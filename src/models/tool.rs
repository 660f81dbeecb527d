//! Tool catalog data models.
//!
//! A `ToolDefinition` declares a tool's name, description, ordered input fields and the
//! JSON Schema advertised to clients. Definitions are immutable after construction and
//! double as the validator for incoming arguments: required fields are checked, types
//! are enforced and declared defaults are filled in before any handler runs.

use crate::error::{DbError, DbResult};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// JSON object as received from (and advertised to) the protocol layer.
pub type JsonObject = Map<String, JsonValue>;

/// Names of the tools in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    Query,
    ListTables,
    DescribeTable,
    GetTableStats,
}

impl ToolName {
    /// All tools, in the order they are advertised.
    pub const ALL: [ToolName; 4] = [
        ToolName::Query,
        ToolName::ListTables,
        ToolName::DescribeTable,
        ToolName::GetTableStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::ListTables => "list_tables",
            Self::DescribeTable => "describe_table",
            Self::GetTableStats => "get_table_stats",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| DbError::unknown_tool(s))
    }
}

/// JSON type of a declared input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
}

impl FieldType {
    /// Name used in the JSON Schema `type` keyword.
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }

    pub fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.as_i64().is_some(),
        }
    }
}

/// Declaration of a single input field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<JsonValue>,
}

impl FieldSchema {
    pub fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, field_type: FieldType, default: JsonValue) -> Self {
        Self {
            name,
            field_type,
            required: false,
            default: Some(default),
        }
    }
}

/// A named, schema-declared operation exposed to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: ToolName,
    pub description: &'static str,
    /// Input fields in declaration order.
    pub fields: Vec<FieldSchema>,
    /// JSON Schema of the tool's argument record, as advertised over MCP.
    pub input_schema: JsonObject,
}

impl ToolDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
    }

    /// Check `arguments` against the declared schema.
    ///
    /// Returns the declared fields only, with defaults applied. A JSON `null` counts as
    /// an absent value. Undeclared arguments are dropped.
    pub fn validate(&self, arguments: &JsonObject) -> DbResult<JsonObject> {
        let mut validated = JsonObject::new();

        for field in &self.fields {
            match arguments.get(field.name) {
                Some(value) if !value.is_null() => {
                    if !field.field_type.accepts(value) {
                        return Err(DbError::invalid_arguments(format!(
                            "argument '{}' of tool '{}' must be of type {}, got {}",
                            field.name,
                            self.name,
                            field.field_type.json_type(),
                            json_type_name(value)
                        )));
                    }
                    validated.insert(field.name.to_string(), value.clone());
                }
                _ if field.required => {
                    return Err(DbError::invalid_arguments(format!(
                        "missing required argument '{}' for tool '{}'",
                        field.name, self.name
                    )));
                }
                _ => {
                    if let Some(default) = &field.default {
                        validated.insert(field.name.to_string(), default.clone());
                    }
                }
            }
        }

        for key in arguments.keys() {
            if self.field(key).is_none() {
                tracing::debug!(tool = %self.name, argument = %key, "Ignoring undeclared argument");
            }
        }

        Ok(validated)
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => "integer",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ToolDefinition {
        ToolDefinition {
            name: ToolName::Query,
            description: "Execute a read-only SQL query",
            fields: vec![
                FieldSchema::required("sql", FieldType::String),
                FieldSchema::optional("limit", FieldType::Integer, json!(100)),
            ],
            input_schema: JsonObject::new(),
        }
    }

    fn args(value: JsonValue) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_tool_name_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
    }

    #[test]
    fn test_unknown_tool_name() {
        let err = "drop_everything".parse::<ToolName>().unwrap_err();
        assert!(matches!(err, DbError::UnknownTool { ref name } if name == "drop_everything"));
    }

    #[test]
    fn test_validate_applies_defaults() {
        let validated = sample().validate(&args(json!({"sql": "SELECT 1"}))).unwrap();
        assert_eq!(validated["sql"], "SELECT 1");
        assert_eq!(validated["limit"], 100);
    }

    #[test]
    fn test_validate_null_uses_default() {
        let validated = sample()
            .validate(&args(json!({"sql": "SELECT 1", "limit": null})))
            .unwrap();
        assert_eq!(validated["limit"], 100);
    }

    #[test]
    fn test_validate_missing_required() {
        let err = sample().validate(&args(json!({"limit": 5}))).unwrap_err();
        assert!(matches!(err, DbError::InvalidArguments { .. }));
        assert!(err.to_string().contains("missing required argument 'sql'"));
    }

    #[test]
    fn test_validate_wrong_type() {
        let err = sample()
            .validate(&args(json!({"sql": "SELECT 1", "limit": "ten"})))
            .unwrap_err();
        assert!(err.to_string().contains("must be of type integer, got string"));

        let err = sample()
            .validate(&args(json!({"sql": "SELECT 1", "limit": 2.5})))
            .unwrap_err();
        assert!(err.to_string().contains("got number"));
    }

    #[test]
    fn test_validate_drops_undeclared_arguments() {
        let validated = sample()
            .validate(&args(json!({"sql": "SELECT 1", "format": "csv"})))
            .unwrap();
        assert!(!validated.contains_key("format"));
    }
}
