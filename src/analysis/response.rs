use super::schema::OutputSchema;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("Response is not valid JSON: {0}")]
    NotJson(String),

    #[error("Response is JSON but not an object (found {0})")]
    NotObject(&'static str),
}

/// Returns the body of the first ```json or bare ``` fence, or the trimmed text
pub fn extract_json_from_markdown(content: &str) -> &str {
    let trimmed = content.trim();

    if let Some(start_idx) = trimmed.find("```json") {
        let after_fence = &trimmed[start_idx + 7..];
        if let Some(end_idx) = after_fence.find("```") {
            return after_fence[..end_idx].trim();
        }
    }

    if let Some(start_idx) = trimmed.find("```") {
        let after_fence = &trimmed[start_idx + 3..];
        if let Some(end_idx) = after_fence.find("```") {
            return after_fence[..end_idx].trim();
        }
    }

    trimmed
}

/// Parses model output into a JSON object.
///
/// The reply is tried as-is first; fences are only stripped when that fails.
pub fn parse_object(content: &str) -> Result<Map<String, Value>, ParseFailure> {
    let value: Value = match serde_json::from_str(content.trim()) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(extract_json_from_markdown(content))
            .map_err(|e| ParseFailure::NotJson(e.to_string()))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(ParseFailure::NotObject("array")),
        Value::String(_) => Err(ParseFailure::NotObject("string")),
        Value::Number(_) => Err(ParseFailure::NotObject("number")),
        Value::Bool(_) => Err(ParseFailure::NotObject("boolean")),
        Value::Null => Err(ParseFailure::NotObject("null")),
    }
}

/// Unwraps the schema wrapper and drops undeclared top-level keys.
///
/// The returned object's keys are always a subset of the schema's fields.
pub fn normalize(
    mut output: Map<String, Value>,
    schema: &OutputSchema,
) -> (Map<String, Value>, Vec<String>) {
    let mut warnings = Vec::new();

    if let Some(wrapper) = &schema.wrapper {
        let only_wrapper = output.len() == 1 && output.contains_key(wrapper);
        if only_wrapper {
            if let Some(Value::Object(inner)) = output.remove(wrapper) {
                output = inner;
            } else {
                warnings.push(format!("'{}' wrapper does not hold an object", wrapper));
            }
        }
    }

    let undeclared: Vec<String> = output
        .keys()
        .filter(|k| !schema.declares(k))
        .cloned()
        .collect();
    for key in undeclared {
        output.remove(&key);
        warnings.push(format!("dropped undeclared field '{}'", key));
    }

    (output, warnings)
}
