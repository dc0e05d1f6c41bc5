//! Human-readable messages for failed requests.
//!
//! Backends answer errors in several shapes. [`extract_message`] picks the
//! first that yields text, in this order:
//!
//! 1. a plain-string body,
//! 2. a `message` string field,
//! 3. an `errors` array (one line per entry),
//! 4. an `errors` object (one line per value),
//! 5. the raw JSON text of any other body,
//! 6. the error's own message,
//! 7. [`FALLBACK_MESSAGE`].

use serde_json::Value;

/// Used when nothing better is available.
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Pick the message to show for a failed request.
///
/// `body` is the raw response body, if any; `error_message` is the
/// display form of the error itself.
pub fn extract_message(body: Option<&str>, error_message: &str) -> String {
    body.and_then(backend_message)
        .filter(|m| !m.is_empty())
        .or_else(|| Some(error_message.to_string()).filter(|m| !m.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

fn backend_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    let Ok(data) = serde_json::from_str::<Value>(body) else {
        // Not JSON: the body itself is the message.
        return Some(body.to_string());
    };

    match &data {
        Value::String(s) => return Some(s.clone()),
        Value::Object(map) => {
            if let Some(Value::String(message)) = map.get("message") {
                if !message.is_empty() {
                    return Some(message.clone());
                }
            }
            match map.get("errors") {
                Some(Value::Array(errors)) => {
                    return Some(errors.iter().map(entry_text).collect::<Vec<_>>().join("\n"));
                }
                Some(Value::Object(errors)) => {
                    return Some(
                        errors
                            .values()
                            .map(|v| match v {
                                Value::Array(items) => {
                                    items.iter().map(plain).collect::<Vec<_>>().join(", ")
                                }
                                other => plain(other),
                            })
                            .collect::<Vec<_>>()
                            .join("\n"),
                    );
                }
                _ => {}
            }
        }
        _ => {}
    }

    is_truthy(&data).then(|| data.to_string())
}

/// An `errors` array entry: its `message` field, itself if a string, or JSON.
fn entry_text(entry: &Value) -> String {
    match entry {
        Value::Object(map) => match map.get("message") {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            _ => entry.to_string(),
        },
        other => plain(other),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
