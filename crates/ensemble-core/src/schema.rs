//! Input schema validation
//!
//! Walks a JSON-Schema subset (`type`, `const`, `enum`, `required`,
//! `properties`, `additionalProperties: false`, `items`) and collects every
//! violation with its `$.path`. All failures are recoverable values; nothing
//! in here panics on malformed schemas or payloads.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// One field-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Location in the payload, e.g. `$.sections[2].label`.
    pub path: String,
    pub message: String,
}

impl FieldViolation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validation outcome carrying every violation found in one pass.
#[derive(Debug, Clone, Error)]
#[error("input validation failed: {}", join_violations(.violations))]
pub struct ValidationFailure {
    pub violations: Vec<FieldViolation>,
}

impl ValidationFailure {
    fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(path, message)],
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(FieldViolation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a payload against a schema.
///
/// A `null` schema accepts anything (a manifest that declares no constraints
/// declares none). A schema that is itself malformed is reported as a
/// violation rather than a fault.
pub fn validate(schema: &Value, value: &Value) -> Result<(), ValidationFailure> {
    if schema.is_null() {
        return Ok(());
    }

    let mut violations = Vec::new();
    check_node(schema, value, "$", &mut violations);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure { violations })
    }
}

/// Validate, then deserialize into a typed view of the payload.
pub fn decode<T: DeserializeOwned>(schema: &Value, value: &Value) -> Result<T, ValidationFailure> {
    validate(schema, value)?;
    serde_json::from_value(value.clone())
        .map_err(|err| ValidationFailure::single("$", format!("payload does not decode: {}", err)))
}

fn check_node(schema: &Value, value: &Value, path: &str, violations: &mut Vec<FieldViolation>) {
    let schema_obj = match schema.as_object() {
        Some(obj) => obj,
        None => {
            violations.push(FieldViolation::new(path, "schema must be an object"));
            return;
        }
    };

    if let Some(type_spec) = schema_obj.get("type") {
        if let Some(violation) = check_type(value, type_spec, path) {
            // The value has the wrong shape; deeper checks would only echo it.
            violations.push(violation);
            return;
        }
    }

    if let Some(constant) = schema_obj.get("const") {
        if value != constant {
            violations.push(FieldViolation::new(path, format!("expected const {}", constant)));
        }
    }

    if let Some(variants) = schema_obj.get("enum").and_then(|v| v.as_array()) {
        if !variants.iter().any(|candidate| candidate == value) {
            violations.push(FieldViolation::new(
                path,
                "is not one of the allowed enum values",
            ));
        }
    }

    let wants_object = schema_obj.contains_key("required") || schema_obj.contains_key("properties");
    if wants_object {
        match value.as_object() {
            Some(object) => {
                if let Some(required) = schema_obj.get("required").and_then(|v| v.as_array()) {
                    for key in required.iter().filter_map(|v| v.as_str()) {
                        if !object.contains_key(key) {
                            violations.push(FieldViolation::new(
                                path,
                                format!("missing required field '{}'", key),
                            ));
                        }
                    }
                }

                if let Some(properties) = schema_obj.get("properties").and_then(|v| v.as_object()) {
                    for (key, property_schema) in properties {
                        if let Some(child_value) = object.get(key) {
                            let child_path = format!("{}.{}", path, key);
                            check_node(property_schema, child_value, &child_path, violations);
                        }
                    }

                    if schema_obj
                        .get("additionalProperties")
                        .and_then(|v| v.as_bool())
                        == Some(false)
                    {
                        for key in object.keys() {
                            if !properties.contains_key(key) {
                                violations.push(FieldViolation::new(
                                    path,
                                    format!("contains unknown field '{}'", key),
                                ));
                            }
                        }
                    }
                }
            }
            None => violations.push(FieldViolation::new(path, "expected type 'object'")),
        }
    }

    if let Some(item_schema) = schema_obj.get("items") {
        match value.as_array() {
            Some(array) => {
                for (idx, item) in array.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, idx);
                    check_node(item_schema, item, &item_path, violations);
                }
            }
            None => violations.push(FieldViolation::new(path, "expected type 'array'")),
        }
    }
}

fn check_type(value: &Value, type_spec: &Value, path: &str) -> Option<FieldViolation> {
    let matches = |t: &str, v: &Value| match t {
        "object" => v.is_object(),
        "array" => v.is_array(),
        "string" => v.is_string(),
        "number" => v.is_number(),
        "integer" => v.as_i64().is_some() || v.as_u64().is_some(),
        "boolean" => v.is_boolean(),
        "null" => v.is_null(),
        _ => false,
    };

    match type_spec {
        Value::String(type_name) => {
            if matches(type_name, value) {
                None
            } else {
                Some(FieldViolation::new(
                    path,
                    format!("expected type '{}'", type_name),
                ))
            }
        }
        Value::Array(types) => {
            let any_match = types
                .iter()
                .filter_map(|t| t.as_str())
                .any(|type_name| matches(type_name, value));
            if any_match {
                None
            } else {
                Some(FieldViolation::new(path, "did not match any allowed type"))
            }
        }
        _ => Some(FieldViolation::new(path, "schema.type must be string or array")),
    }
}
