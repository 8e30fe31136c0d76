//! Answer extraction from a raw Chat Completions response.
//!
//! The response shape belongs to a third party, so every level of
//! `choices[0].message.tool_calls[0].function.arguments` is optional and a missing
//! level degrades to a fallback instead of an error.

use serde_json::Value;

use crate::models::answer::{ExtractedAnswer, Fallback};

/// Arguments string assumed when the tool call carries none.
const EMPTY_ARGUMENTS: &str = "{}";

/// Walk a completion response and pull out the `get_answer` tool-call argument.
///
/// Precedence (first match wins):
/// 1. `choices` missing, not an array, or empty -> `InvalidResponseFormat`
/// 2. `arguments` present but not a string -> `InvalidResponseFormat`
/// 3. `arguments` (default `"{}"`) not valid JSON -> `InvalidJson`
/// 4. parsed arguments without an `answer` value -> `InvalidResponseFormat`
/// 5. otherwise the `answer` value
pub fn extract_answer(body: &Value) -> ExtractedAnswer {
    let Some(first_choice) = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    else {
        return Fallback::InvalidResponseFormat.into();
    };

    let arguments = first_choice
        .get("message")
        .and_then(|m| m.get("tool_calls"))
        .and_then(Value::as_array)
        .and_then(|calls| calls.first())
        .and_then(|call| call.get("function"))
        .and_then(|f| f.get("arguments"));

    let raw = match arguments {
        None | Some(Value::Null) => EMPTY_ARGUMENTS,
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Fallback::InvalidResponseFormat.into(),
    };

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "tool call arguments are not valid JSON");
            return Fallback::InvalidJson.into();
        }
    };

    match parsed.get("answer").and_then(answer_text) {
        Some(answer) => ExtractedAnswer::Answer(answer),
        None => Fallback::InvalidResponseFormat.into(),
    }
}

/// Strings pass through as-is; other scalars keep their JSON text (`17` -> `"17"`).
fn answer_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(v.to_string()),
        _ => None,
    }
}
