//! Roadmap validation: the trust boundary between free-form model output and
//! the typed `RoadmapDocument`.
//!
//! Two stages, run in order:
//! 1. Syntax: the text must parse as JSON → otherwise `Malformed`.
//! 2. Shape: the value must match the roadmap contract → otherwise `Schema`.
//!
//! Nothing that fails either stage ever leaves this module as a document.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::roadmap::models::{RoadmapDocument, RoadmapStep};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid JSON: {0}")]
    Malformed(String),

    #[error("{0}")]
    Schema(String),
}

/// Parses sanitized model output into a `RoadmapDocument`.
pub fn parse_roadmap(text: &str) -> Result<RoadmapDocument, ValidationError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    check_document(&value)
}

/// Shape check on an already-parsed value.
pub fn check_document(value: &Value) -> Result<RoadmapDocument, ValidationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| schema(format!("expected an object, found {}", kind(value))))?;

    let title = non_empty_string(obj, "title")?;
    let description = non_empty_string(obj, "description")?;

    let steps = match obj.get("steps") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| check_step(i, item))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => return Err(schema(format!("steps must be an array, found {}", kind(other)))),
        None => return Err(schema("missing steps".to_string())),
    };

    Ok(RoadmapDocument {
        title,
        description,
        steps,
    })
}

fn check_step(index: usize, value: &Value) -> Result<RoadmapStep, ValidationError> {
    let path = format!("steps[{index}]");
    let obj = value
        .as_object()
        .ok_or_else(|| schema(format!("{path} must be an object, found {}", kind(value))))?;

    let resources = match obj.get("resources") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .enumerate()
                .map(|(j, r)| {
                    r.as_str().map(str::to_string).ok_or_else(|| {
                        schema(format!(
                            "{path}.resources[{j}] must be a string, found {}",
                            kind(r)
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(other) => {
            return Err(schema(format!(
                "{path}.resources must be an array, found {}",
                kind(other)
            )))
        }
    };

    Ok(RoadmapStep {
        title: string_field(obj, "title", &path)?,
        description: string_field(obj, "description", &path)?,
        duration: string_field(obj, "duration", &path)?,
        resources,
    })
}

/// Top-level string field that must not be blank.
fn non_empty_string(obj: &Map<String, Value>, key: &str) -> Result<String, ValidationError> {
    let s = string_field_at(obj, key, key)?;
    if s.trim().is_empty() {
        return Err(schema(format!("{key} must not be empty")));
    }
    Ok(s)
}

fn string_field(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<String, ValidationError> {
    string_field_at(obj, key, &format!("{parent}.{key}"))
}

fn string_field_at(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<String, ValidationError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(schema(format!("{path} must be a string, found {}", kind(other)))),
        None => Err(schema(format!("missing {path}"))),
    }
}

fn schema(msg: String) -> ValidationError {
    ValidationError::Schema(msg)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
