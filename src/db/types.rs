//! PostgreSQL type mappings.
//!
//! This module converts backend rows into positional JSON values so that the
//! formatter never sees a driver type.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Per-category decoders handle the actual value extraction
//!
//! Types outside every category are read as text when their wire representation is
//! valid UTF-8, and rendered as `<type>` otherwise.

use crate::models::Row;
use serde_json::Value as JsonValue;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueFormat, PgValueRef};
use sqlx::types::BigDecimal;
use sqlx::{Column, Decode, Row as _, Type, TypeInfo, ValueRef};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Oid,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Uuid,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Unknown,
}

/// Classify a PostgreSQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower == "numeric" || lower == "decimal" {
        return TypeCategory::Decimal;
    }

    match lower.as_str() {
        "int2" | "int4" | "int8" | "smallint" | "integer" | "bigint" | "smallserial"
        | "serial" | "bigserial" => TypeCategory::Integer,
        "oid" => TypeCategory::Oid,
        "float4" | "float8" | "real" | "double precision" => TypeCategory::Float,
        "bool" | "boolean" => TypeCategory::Boolean,
        "text" | "varchar" | "bpchar" | "char" | "name" | "citext" | "character varying" => {
            TypeCategory::Text
        }
        "bytea" => TypeCategory::Binary,
        "json" | "jsonb" => TypeCategory::Json,
        "uuid" => TypeCategory::Uuid,
        "date" => TypeCategory::Date,
        "time" => TypeCategory::Time,
        "timestamp" => TypeCategory::Timestamp,
        "timestamptz" => TypeCategory::TimestampTz,
        _ => TypeCategory::Unknown,
    }
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// NUMERIC value kept as its exact decimal string.
///
/// Prepared statements return NUMERIC in binary form, which is decoded through
/// `BigDecimal`. The special values it cannot hold are read from the sign word.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        <BigDecimal as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        match value.format() {
            PgValueFormat::Text => Ok(RawDecimal(value.as_str()?.to_string())),
            PgValueFormat::Binary => {
                if let Some(special) = special_numeric(value.as_bytes()?) {
                    return Ok(RawDecimal(special.to_string()));
                }
                let decimal = <BigDecimal as Decode<sqlx::Postgres>>::decode(value)?;
                Ok(RawDecimal(decimal.to_plain_string()))
            }
        }
    }
}

/// `NaN` and the infinities of a binary NUMERIC, identified by its sign word.
///
/// Layout: ndigits, weight, sign and dscale as big-endian u16, then the digits.
pub fn special_numeric(bytes: &[u8]) -> Option<&'static str> {
    let sign = u16::from_be_bytes([*bytes.get(4)?, *bytes.get(5)?]);
    match sign {
        0xC000 => Some("NaN"),
        0xD000 => Some("Infinity"),
        0xF000 => Some("-Infinity"),
        _ => None,
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Decode binary data to a JSON string: UTF-8 text when valid, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

// =============================================================================
// Row to JSON Trait
// =============================================================================

/// Trait for converting database rows to positional JSON rows.
pub trait RowToJson {
    fn column_names(&self) -> Vec<String>;
    fn to_json_row(&self) -> Row;
}

impl RowToJson for PgRow {
    fn column_names(&self) -> Vec<String> {
        self.columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect()
    }

    fn to_json_row(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                decode_column(self, idx, type_name, categorize_type(type_name))
            })
            .collect()
    }
}

// =============================================================================
// Decoders
// =============================================================================

fn decode_column(row: &PgRow, idx: usize, type_name: &str, category: TypeCategory) -> JsonValue {
    let is_null = match row.try_get_raw(idx) {
        Ok(raw) => raw.is_null(),
        Err(e) => {
            tracing::error!(column = idx, error = %e, "Failed to read column");
            return JsonValue::Null;
        }
    };
    if is_null {
        return JsonValue::Null;
    }

    match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Oid => decode_oid(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Binary => decode_binary_col(row, idx),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Uuid => decode_uuid(row, idx),
        TypeCategory::Date => decode_display::<chrono::NaiveDate>(row, idx),
        TypeCategory::Time => decode_display::<chrono::NaiveTime>(row, idx),
        TypeCategory::Timestamp => decode_display::<chrono::NaiveDateTime>(row, idx),
        TypeCategory::TimestampTz => decode_display::<chrono::DateTime<chrono::Utc>>(row, idx),
        TypeCategory::Text => decode_text(row, idx),
        TypeCategory::Unknown => decode_unknown(row, idx, type_name),
    }
}

fn decode_decimal(row: &PgRow, idx: usize) -> JsonValue {
    match row.try_get::<RawDecimal, _>(idx) {
        Ok(v) => JsonValue::String(v.0),
        Err(e) => {
            tracing::error!("Failed to decode NUMERIC: {:?}", e);
            JsonValue::Null
        }
    }
}

fn decode_integer(row: &PgRow, idx: usize) -> JsonValue {
    if let Ok(v) = row.try_get::<i16, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return JsonValue::Number(v.into());
    }
    JsonValue::Null
}

fn decode_oid(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Oid, _>(idx)
        .map(|oid| JsonValue::Number(oid.0.into()))
        .unwrap_or(JsonValue::Null)
}

fn decode_boolean(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<bool, _>(idx)
        .map(JsonValue::Bool)
        .unwrap_or(JsonValue::Null)
}

fn decode_float(row: &PgRow, idx: usize) -> JsonValue {
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    if let Ok(v) = row.try_get::<f32, _>(idx) {
        return serde_json::Number::from_f64(v as f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    JsonValue::Null
}

fn decode_binary_col(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Vec<u8>, _>(idx)
        .map(|v| decode_binary_value(&v))
        .unwrap_or(JsonValue::Null)
}

fn decode_json(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<serde_json::Value, _>(idx)
        .unwrap_or(JsonValue::Null)
}

fn decode_uuid(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<uuid::Uuid, _>(idx)
        .map(|v| JsonValue::String(v.to_string()))
        .unwrap_or(JsonValue::Null)
}

fn decode_display<T>(row: &PgRow, idx: usize) -> JsonValue
where
    T: for<'r> Decode<'r, sqlx::Postgres> + Type<sqlx::Postgres> + std::fmt::Display,
{
    row.try_get::<T, _>(idx)
        .map(|v| JsonValue::String(v.to_string()))
        .unwrap_or(JsonValue::Null)
}

fn decode_text(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<String, _>(idx)
        .map(JsonValue::String)
        .unwrap_or(JsonValue::Null)
}

fn decode_unknown(row: &PgRow, idx: usize, type_name: &str) -> JsonValue {
    // Domains and enums share the text representation of their base type.
    match row.try_get_unchecked::<String, _>(idx) {
        Ok(v) => JsonValue::String(v),
        Err(_) => JsonValue::String(format!("<{}>", type_name.to_lowercase())),
    }
}
