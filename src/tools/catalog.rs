//! Static catalog of the tools this server exposes.
//!
//! The advertised JSON Schema of each tool is derived from its argument record; the
//! ordered field list drives argument validation in the dispatcher.

use crate::models::{
    DEFAULT_ROW_LIMIT, DEFAULT_SCHEMA, FieldSchema, FieldType, JsonObject, ToolDefinition,
    ToolName,
};
use crate::tools::query::QueryArgs;
use crate::tools::schema::{ListTablesArgs, TableArgs};
use schemars::JsonSchema;
use serde_json::json;
use std::sync::LazyLock;

static DEFINITIONS: LazyLock<Vec<ToolDefinition>> =
    LazyLock::new(|| ToolName::ALL.into_iter().map(definition_for).collect());

/// All tool definitions, in the order they are advertised.
pub fn list_definitions() -> &'static [ToolDefinition] {
    &DEFINITIONS
}

/// Definition of a single tool.
pub fn definition(name: ToolName) -> &'static ToolDefinition {
    // DEFINITIONS is built from ToolName::ALL in declaration order.
    &DEFINITIONS[name as usize]
}

/// JSON Schema of an argument record, without the document-level keys.
fn input_schema_for<T: JsonSchema>() -> JsonObject {
    let mut schema = schemars::schema_for!(T)
        .as_object()
        .cloned()
        .unwrap_or_default();
    for key in ["$schema", "title", "description"] {
        schema.remove(key);
    }
    schema
}

fn schema_field() -> FieldSchema {
    FieldSchema::optional("schema", FieldType::String, json!(DEFAULT_SCHEMA))
}

fn definition_for(name: ToolName) -> ToolDefinition {
    match name {
        ToolName::Query => ToolDefinition {
            name,
            description: "Execute a read-only SQL query on the database",
            fields: vec![
                FieldSchema::required("sql", FieldType::String),
                FieldSchema::optional("limit", FieldType::Integer, json!(DEFAULT_ROW_LIMIT)),
            ],
            input_schema: input_schema_for::<QueryArgs>(),
        },
        ToolName::ListTables => ToolDefinition {
            name,
            description: "List all tables in the database",
            fields: vec![schema_field()],
            input_schema: input_schema_for::<ListTablesArgs>(),
        },
        ToolName::DescribeTable => ToolDefinition {
            name,
            description: "Show the schema/structure of a specific table",
            fields: vec![FieldSchema::required("table", FieldType::String), schema_field()],
            input_schema: input_schema_for::<TableArgs>(),
        },
        ToolName::GetTableStats => ToolDefinition {
            name,
            description: "Get statistics about a table (row count, size, etc.)",
            fields: vec![FieldSchema::required("table", FieldType::String), schema_field()],
            input_schema: input_schema_for::<TableArgs>(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as JsonValue;

    fn advertised_required(def: &ToolDefinition) -> Vec<String> {
        let mut required: Vec<String> = def
            .input_schema
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        required.sort();
        required
    }

    #[test]
    fn test_catalog_order() {
        let names: Vec<&str> = list_definitions().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["query", "list_tables", "describe_table", "get_table_stats"]
        );
    }

    #[test]
    fn test_definition_lookup_matches_name() {
        for tool in ToolName::ALL {
            assert_eq!(definition(tool).name, tool);
        }
    }

    #[test]
    fn test_query_schema() {
        let query = definition(ToolName::Query);
        assert_eq!(query.required_fields().collect::<Vec<_>>(), ["sql"]);
        assert_eq!(query.field("limit").unwrap().default, Some(json!(100)));

        let properties = &query.input_schema["properties"];
        assert_eq!(properties["sql"]["type"], "string");
        assert_eq!(properties["limit"]["type"], "integer");
        assert_eq!(properties["limit"]["default"], 100);
        assert_eq!(properties["limit"]["minimum"], 0);
    }

    #[test]
    fn test_table_tools_require_table() {
        for tool in [ToolName::DescribeTable, ToolName::GetTableStats] {
            let def = definition(tool);
            assert_eq!(def.required_fields().collect::<Vec<_>>(), ["table"]);
            assert_eq!(def.field("schema").unwrap().default, Some(json!("public")));
            assert_eq!(def.input_schema["properties"]["schema"]["default"], "public");
        }
    }

    #[test]
    fn test_list_tables_has_no_required_fields() {
        let def = definition(ToolName::ListTables);
        assert_eq!(def.required_fields().count(), 0);
        assert!(advertised_required(def).is_empty());
    }

    #[test]
    fn test_advertised_schema_matches_declared_fields() {
        for def in list_definitions() {
            assert_eq!(def.input_schema["type"], "object");
            assert!(!def.input_schema.contains_key("$schema"));

            let properties = def.input_schema["properties"].as_object().unwrap();
            let mut advertised: Vec<&str> = properties.keys().map(String::as_str).collect();
            let mut declared: Vec<&str> = def.fields.iter().map(|f| f.name).collect();
            advertised.sort();
            declared.sort();
            assert_eq!(advertised, declared, "fields of {}", def.name);

            let mut required: Vec<String> =
                def.required_fields().map(str::to_string).collect();
            required.sort();
            assert_eq!(advertised_required(def), required, "required of {}", def.name);
        }
    }
}
