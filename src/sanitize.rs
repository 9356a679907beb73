// src/sanitize.rs
//
// Argument capture for observer events. Credentials supplied to the platform
// (passwords, TOTP secrets, backup codes) must never reach an observer.

use serde::Serialize;
use serde_json::Value;

/// Keys whose values are replaced before arguments are reported
pub const REDACTED_KEYS: &[&str] = &["password", "totp_secret", "backup_codes"];

/// Placeholder written in place of a redacted value
pub const REDACTED: &str = "[REDACTED]";

/// Serializes `arguments` for reporting, with credentials redacted
///
/// # Arguments
/// * `arguments` - Anything the facade wants to report as the call's input
///
/// # Returns
/// * `Value` - The JSON rendering, or `null` if it cannot be serialized
///
/// # Examples
/// ```
/// use clerk_guard::sanitize::capture;
/// use serde_json::json;
///
/// let captured = capture(&json!({"username": "ada", "password": "hunter2"}));
/// assert_eq!(captured, json!({"username": "ada", "password": "[REDACTED]"}));
/// ```
pub fn capture<A: Serialize + ?Sized>(arguments: &A) -> Value {
    let value = serde_json::to_value(arguments).unwrap_or(Value::Null);
    redact(value)
}

/// Recursively replaces values stored under any of [`REDACTED_KEYS`]
pub fn redact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| {
                    if REDACTED_KEYS.contains(&key.as_str()) && !inner.is_null() {
                        (key, Value::String(REDACTED.to_string()))
                    } else {
                        (key, redact(inner))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        other => other,
    }
}
